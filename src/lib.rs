//! `Skycast` - Hourly astrophotography sky forecasts
//!
//! This library fetches Open-Meteo forecasts, rates every hour for clear and
//! steady skies, and renders a plain-text report with sun and moon times.

pub mod api;
pub mod astro;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod service;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use astro::{Almanac, Astronomy, Body, RiseSet};
pub use cache::{CacheRejection, CacheStore};
pub use config::SkycastConfig;
pub use error::SkycastError;
pub use models::{ForecastPoint, Location, RatedPoint, RawForecastPayload, Suggestion};
pub use report::{ReportOptions, TemperatureUnit, WindSpeedUnit};
pub use service::SkyReportService;
pub use weather::{MetricsEngine, OpenMeteoClient, Thresholds};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
