//! Raw provider payload and the per-hour records built from it

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::Location;

/// Open-Meteo forecast response.
///
/// The hourly arrays are parallel but not guaranteed to have equal length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForecastPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    /// IANA zone name, e.g. "Europe/Berlin"
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub hourly: HourlySeries,
}

/// Hourly arrays, one entry per forecast hour. `null` entries decode as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default, rename = "temperature_500hPa")]
    pub temperature_500hpa: Vec<Option<f64>>,
    #[serde(default, rename = "temperature_850hPa")]
    pub temperature_850hpa: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover_low: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover_mid: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover_high: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gusts_10m: Vec<Option<f64>>,
    #[serde(default, rename = "wind_speed_200hPa")]
    pub wind_speed_200hpa: Vec<Option<f64>>,
    #[serde(default, rename = "wind_speed_850hPa")]
    pub wind_speed_850hpa: Vec<Option<f64>>,
    #[serde(default, rename = "geopotential_height_850hPa")]
    pub geopotential_height_850hpa: Vec<Option<f64>>,
    #[serde(default, rename = "geopotential_height_500hPa")]
    pub geopotential_height_500hpa: Vec<Option<f64>>,
}

/// One forecast hour. Every field comes from the same array index.
///
/// Missing provider values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub time: DateTime<Tz>,
    pub location: Location,
    /// Celsius
    pub temperature_2m: f64,
    pub temperature_500hpa: f64,
    pub temperature_850hpa: f64,
    /// Percent
    pub cloud_cover_low: f64,
    pub cloud_cover_mid: f64,
    pub cloud_cover_high: f64,
    /// km/h
    pub wind_speed_10m: f64,
    pub wind_gusts_10m: f64,
    pub wind_speed_200hpa: f64,
    pub wind_speed_850hpa: f64,
    /// Meters
    pub geopotential_height_850hpa: f64,
    pub geopotential_height_500hpa: f64,
}

impl ForecastPoint {
    #[must_use]
    pub fn utc_time(&self) -> DateTime<Utc> {
        self.time.with_timezone(&Utc)
    }
}

/// A forecast hour with its derived metrics attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedPoint {
    pub point: ForecastPoint,
    /// Clouds and wind are all within their ceilings
    pub suitable: bool,
    /// Heuristic turbulence proxy in [0.5, 5.0], lower is better
    pub seeing_index: f64,
    /// Percent of the lunar disc lit, 0..=100
    pub moon_illumination: u8,
}
