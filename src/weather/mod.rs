//! Forecast retrieval, per-hour reconciliation and derived metrics

pub mod metrics;
pub mod open_meteo;
pub mod reconcile;

pub use metrics::{MetricsEngine, Thresholds};
pub use open_meteo::OpenMeteoClient;
pub use reconcile::build_points;
