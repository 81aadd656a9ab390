//! Location model, coordinate validation and key formatting

use serde::{Deserialize, Serialize};

use crate::SkycastError;

/// Site coordinates as reported by the forecast provider
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Site elevation in meters
    pub elevation: f64,
}

impl Location {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

/// Check that a coordinate pair is finite and inside the WGS84 ranges.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> crate::Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(SkycastError::validation(format!(
            "Latitude must be between -90 and 90, got: {latitude}"
        )));
    }

    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(SkycastError::validation(format!(
            "Longitude must be between -180 and 180, got: {longitude}"
        )));
    }

    Ok(())
}

/// Round a coordinate to `precision` decimal places. Negative zero becomes zero
/// so that keys on either side of the equator or meridian do not split.
#[must_use]
pub fn round_coordinate(value: f64, precision: u32) -> f64 {
    let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(6));
    (value * multiplier).round() / multiplier + 0.0
}

/// Fixed 6 decimal representation used on the wire and in forecast keys.
#[must_use]
pub fn format_coordinate(value: f64) -> String {
    format!("{value:.6}")
}
