//! Data models for Skycast
//!
//! This module contains the core domain models organized by concern:
//! - Location: site coordinates and key formatting helpers
//! - Forecast: raw provider payload, per-hour points and rated points
//! - Suggestion: place lookup results

pub mod forecast;
pub mod location;
pub mod suggestion;

// Re-export all public types for convenient access
pub use forecast::{ForecastPoint, HourlySeries, RatedPoint, RawForecastPayload};
pub use location::Location;
pub use suggestion::Suggestion;
