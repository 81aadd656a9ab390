//! Derived metrics for forecast hours
//!
//! Suitability, a seeing (turbulence) index and moon illumination. Pure
//! computation, no I/O.

use tracing::debug;

use crate::astro::Astronomy;
use crate::config::ThresholdConfig;
use crate::models::{ForecastPoint, RatedPoint};

/// Seeing index bounds. Lower is better.
pub const SEEING_BEST: f64 = 0.5;
pub const SEEING_WORST: f64 = 5.0;

const SEEING_SCALE: f64 = 0.12;
const SHEAR_EXPONENT: f64 = 0.6;
const LAPSE_EXPONENT: f64 = 0.4;
const MIN_LAYER_DEPTH_M: f64 = 100.0;
const JET_PENALTY_PER_MS: f64 = 0.02;
const JET_PENALTY_CAP: f64 = 1.5;

/// Ceilings for a clear, calm hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Per layer, percent
    pub max_cloud_cover: f64,
    /// Applies to both wind speed and gusts, km/h
    pub max_wind_kmh: f64,
    /// 200 hPa wind above which the jet-stream penalty applies, m/s
    pub jet_stream_threshold_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&ThresholdConfig::default())
    }
}

impl From<&ThresholdConfig> for Thresholds {
    fn from(config: &ThresholdConfig) -> Self {
        Self {
            max_cloud_cover: config.max_cloud_cover,
            max_wind_kmh: config.max_wind_kmh,
            jet_stream_threshold_ms: config.jet_stream_threshold_ms,
        }
    }
}

fn within(value: f64, ceiling: f64) -> bool {
    // NaN fails both comparisons
    value >= 0.0 && value <= ceiling
}

fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / 3.6
}

/// Every cloud layer and both wind readings are inside their ceilings.
#[must_use]
pub fn is_suitable(point: &ForecastPoint, thresholds: &Thresholds) -> bool {
    let clouds = [
        point.cloud_cover_low,
        point.cloud_cover_mid,
        point.cloud_cover_high,
    ];
    let winds = [point.wind_speed_10m, point.wind_gusts_10m];

    clouds
        .iter()
        .all(|&cover| within(cover, thresholds.max_cloud_cover))
        && winds
            .iter()
            .all(|&speed| within(speed, thresholds.max_wind_kmh))
}

/// Heuristic seeing index in [`SEEING_BEST`, `SEEING_WORST`].
///
/// Combines vertical wind shear with the lapse rate between 2 m and 500 hPa,
/// scaled up when the 200 hPa wind exceeds the jet-stream threshold.
#[must_use]
pub fn seeing_index(point: &ForecastPoint, jet_stream_threshold_ms: f64) -> f64 {
    let depth_m = (point.geopotential_height_500hpa - point.location.elevation).max(MIN_LAYER_DEPTH_M);
    let lapse = (point.temperature_2m - point.temperature_500hpa) / (depth_m / 1000.0);

    let v200 = kmh_to_ms(point.wind_speed_200hpa);
    let v850 = kmh_to_ms(point.wind_speed_850hpa);
    let v10 = kmh_to_ms(point.wind_speed_10m);
    let shear = (v200 - v850).abs() + (v850 - v10).abs();

    let mut index = SEEING_SCALE * shear.powf(SHEAR_EXPONENT) * lapse.abs().powf(LAPSE_EXPONENT);

    if v200 > jet_stream_threshold_ms {
        index *= (1.0 + JET_PENALTY_PER_MS * (v200 - jet_stream_threshold_ms)).min(JET_PENALTY_CAP);
    }

    if !index.is_finite() {
        return SEEING_WORST;
    }
    index.clamp(SEEING_BEST, SEEING_WORST)
}

/// Moon illumination as a whole percent
#[must_use]
pub fn moon_percent(point: &ForecastPoint, astronomy: &dyn Astronomy) -> u8 {
    let raw = astronomy.illumination(point.utc_time());
    if raw.is_nan() {
        return 0;
    }
    // clamped to 0..=100 first, so the cast cannot truncate
    raw.round().clamp(0.0, 100.0) as u8
}

/// Attaches the derived metrics to forecast hours
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    thresholds: Thresholds,
}

impl MetricsEngine {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn rate_point(&self, point: ForecastPoint, astronomy: &dyn Astronomy) -> RatedPoint {
        RatedPoint {
            suitable: is_suitable(&point, &self.thresholds),
            seeing_index: seeing_index(&point, self.thresholds.jet_stream_threshold_ms),
            moon_illumination: moon_percent(&point, astronomy),
            point,
        }
    }

    /// Rate every point, keeping input order
    #[must_use]
    pub fn rate(&self, points: Vec<ForecastPoint>, astronomy: &dyn Astronomy) -> Vec<RatedPoint> {
        let rated: Vec<RatedPoint> = points
            .into_iter()
            .map(|point| self.rate_point(point, astronomy))
            .collect();

        debug!(
            "Rated {} hours, {} suitable",
            rated.len(),
            rated.iter().filter(|p| p.suitable).count()
        );
        rated
    }
}
