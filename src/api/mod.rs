use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::error::SkycastError;
use crate::models::Suggestion;
use crate::report::ReportOptions;
use crate::service::SkyReportService;

pub type AppState = Arc<SkyReportService>;

/// Handler failures, rendered as plain text bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    lat: Option<String>,
    lon: Option<String>,
    unit_temp: Option<String>,
    unit_wind: Option<String>,
    time_12h: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinateParams {
    lat: Option<String>,
    lon: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route("/suggestions", get(get_suggestions))
        .route("/reverse-geocoding", get(get_reverse_geocoding))
        .with_state(state)
}

fn parse_coordinates(lat: Option<&str>, lon: Option<&str>) -> Result<(f64, f64), ApiError> {
    let lat = lat.map(str::trim).unwrap_or_default();
    let lon = lon.map(str::trim).unwrap_or_default();

    if lat.is_empty() || lon.is_empty() {
        return Err(ApiError::BadRequest(
            "Latitude and longitude are required".to_string(),
        ));
    }

    match (lat.parse::<f64>(), lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) => Ok((lat, lon)),
        _ => Err(ApiError::BadRequest(
            "Invalid latitude or longitude".to_string(),
        )),
    }
}

async fn get_weather(
    State(service): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Response, ApiError> {
    let (lat, lon) = parse_coordinates(params.lat.as_deref(), params.lon.as_deref())?;
    let options = ReportOptions::from_params(
        params.unit_temp.as_deref(),
        params.unit_wind.as_deref(),
        params.time_12h.as_deref().map(str::trim) == Some("1"),
    );

    info!("Requested weather data for lat: {}, lon: {}", lat, lon);

    match service.report(lat, lon, &options).await {
        Ok(table) => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            table,
        )
            .into_response()),
        Err(e) if e.is_client_error() => Err(ApiError::BadRequest(e.user_message())),
        Err(e) => {
            error!("Weather report failed: {}", e);
            Err(ApiError::BadGateway(e.user_message()))
        }
    }
}

async fn get_suggestions(
    State(service): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    let query = params.q.unwrap_or_default();

    match service.search(&query).await {
        Ok(suggestions) => Ok(Json(suggestions)),
        Err(SkycastError::Validation { .. }) => Err(ApiError::BadRequest(
            "Query parameter is missing".to_string(),
        )),
        Err(e) => {
            error!("Suggestion lookup failed: {}", e);
            Err(ApiError::Internal("Unable to fetch suggestions".to_string()))
        }
    }
}

async fn get_reverse_geocoding(
    State(service): State<AppState>,
    Query(params): Query<CoordinateParams>,
) -> Result<Json<Value>, ApiError> {
    let (lat, lon) = parse_coordinates(params.lat.as_deref(), params.lon.as_deref())?;

    info!("Reverse geocoding for lat: {}, lon: {}", lat, lon);

    match service.reverse_lookup(lat, lon).await {
        Ok(Some(suggestion)) => {
            let value = serde_json::to_value(suggestion)
                .map_err(|e| ApiError::Internal(format!("Unable to encode result: {e}")))?;
            Ok(Json(value))
        }
        Ok(None) => Ok(Json(json!({}))),
        Err(e) if e.is_client_error() => Err(ApiError::BadRequest(e.user_message())),
        Err(e) => {
            warn!("Reverse geocoding failed, returning empty result: {}", e);
            Ok(Json(json!({})))
        }
    }
}
