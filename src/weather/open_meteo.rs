//! Open-Meteo forecast and geocoding clients
//!
//! Every lookup consults the [`CacheStore`] first. Cache writes are best
//! effort: a rejected entry is logged and the fresh data is still returned.

use std::sync::Arc;
use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::{MAX_RETRY_BACKOFF_SECONDS, ProviderConfig};
use crate::error::SkycastError;
use crate::models::location::{format_coordinate, round_coordinate};
use crate::models::suggestion::GeocodingResponse;
use crate::models::{RawForecastPayload, Suggestion};

/// Decimal places kept for reverse lookups (about 111 m)
const REVERSE_PRECISION: u32 = 3;

/// `weather:<lat>,<lon>:<params>` with 6 decimal coordinates
#[must_use]
pub fn forecast_cache_key(latitude: f64, longitude: f64, hourly_parameters: &str) -> String {
    format!(
        "weather:{},{}:{}",
        format_coordinate(latitude),
        format_coordinate(longitude),
        hourly_parameters
    )
}

/// Query-string escaping with spaces as `+`, the form existing search
/// keys were written in.
fn query_escape(query: &str) -> String {
    urlencoding::encode(query).replace("%20", "+")
}

/// Keys to try for a place search, current first, then the legacy
/// unprefixed one. Only the first is ever written.
#[must_use]
pub fn search_cache_keys(query: &str) -> [String; 2] {
    let escaped = query_escape(query);
    [format!("geo:{escaped}"), escaped]
}

/// `reverse:<lat>,<lon>` on coordinates rounded to 3 decimals
#[must_use]
pub fn reverse_cache_key(latitude: f64, longitude: f64) -> String {
    format!(
        "reverse:{:.3},{:.3}",
        round_coordinate(latitude, REVERSE_PRECISION),
        round_coordinate(longitude, REVERSE_PRECISION)
    )
}

pub struct OpenMeteoClient {
    http: ClientWithMiddleware,
    cache: Arc<CacheStore>,
    config: ProviderConfig,
}

impl OpenMeteoClient {
    pub fn new(config: &ProviderConfig, cache: Arc<CacheStore>) -> crate::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(
                Duration::from_millis(500),
                Duration::from_secs(MAX_RETRY_BACKOFF_SECONDS),
            )
            .build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            cache,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Hourly forecast for a coordinate pair.
    ///
    /// Non-2xx, transport failures and undecodable bodies are errors.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> crate::Result<RawForecastPayload> {
        let parameters = &self.config.hourly_parameters;
        let key = forecast_cache_key(latitude, longitude, parameters);

        if let Some(payload) = self.cached::<RawForecastPayload>(&key).await {
            return Ok(payload);
        }

        let url = format!(
            "{}?latitude={}&longitude={}&hourly={}&timezone=auto",
            self.config.forecast_url,
            format_coordinate(latitude),
            format_coordinate(longitude),
            urlencoding::encode(parameters)
        );
        info!("Requesting forecast from Open-Meteo");

        let body = self.get_bytes(&url, "forecast").await?;
        let payload: RawForecastPayload = serde_json::from_slice(&body)
            .map_err(|e| SkycastError::decode(format!("Failed to parse forecast response: {e}")))?;

        self.store(&key, body).await;
        Ok(payload)
    }

    /// Place search by free-text name.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> crate::Result<Vec<Suggestion>> {
        let keys = search_cache_keys(query);

        for key in &keys {
            if let Some(suggestions) = self.cached::<Vec<Suggestion>>(key).await {
                return Ok(suggestions);
            }
        }

        let url = format!(
            "{}?name={}",
            self.config.geocoding_url,
            urlencoding::encode(query)
        );
        info!("Requesting place suggestions from Open-Meteo");

        let body = self.get_bytes(&url, "search").await?;
        let response: GeocodingResponse = serde_json::from_slice(&body)
            .map_err(|e| SkycastError::decode(format!("Failed to parse search response: {e}")))?;

        let serialized = serde_json::to_vec(&response.results)?;
        self.store(&keys[0], serialized).await;

        info!("Found {} suggestions", response.results.len());
        Ok(response.results)
    }

    /// Best place match for a coordinate pair.
    ///
    /// Upstream trouble (status, transport, timeout) and empty results are
    /// `Ok(None)`; only an undecodable live response is an error.
    #[tracing::instrument(skip(self))]
    pub async fn reverse_lookup(&self, latitude: f64, longitude: f64) -> crate::Result<Option<Suggestion>> {
        let key = reverse_cache_key(latitude, longitude);

        if let Some(suggestion) = self.cached::<Suggestion>(&key).await {
            return Ok(Some(suggestion));
        }

        let url = format!(
            "{}?latitude={:.3}&longitude={:.3}",
            self.config.reverse_geocoding_url,
            round_coordinate(latitude, REVERSE_PRECISION),
            round_coordinate(longitude, REVERSE_PRECISION)
        );
        info!("Requesting reverse geocoding from Open-Meteo");

        let body = match self.get_bytes(&url, "reverse").await {
            Ok(body) => body,
            Err(e) => {
                warn!("Reverse geocoding unavailable, returning no result: {}", e);
                return Ok(None);
            }
        };

        let response: GeocodingResponse = serde_json::from_slice(&body).map_err(|e| {
            SkycastError::decode(format!("Failed to parse reverse geocoding response: {e}"))
        })?;

        let Some(top) = response.results.into_iter().next() else {
            debug!("Reverse geocoding returned no results");
            return Ok(None);
        };

        let serialized = serde_json::to_vec(&top)?;
        self.store(&key, serialized).await;
        Ok(Some(top))
    }

    async fn get_bytes(&self, url: &str, endpoint: &str) -> crate::Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "Open-Meteo returned an error status");
            return Err(SkycastError::upstream(status.as_u16(), endpoint));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key, "Using cached response");
                Some(value)
            }
            Err(e) => {
                warn!(key, "Unreadable cache entry, refetching: {}", e);
                None
            }
        }
    }

    async fn store(&self, key: &str, value: Vec<u8>) {
        match self.cache.set(key, value).await {
            Ok(()) => info!(key, "Cached response"),
            Err(e) => warn!(key, "Failed to cache response: {}", e),
        }
    }
}
