//! One sky report per request: fetch, reconcile, rate, render

use std::sync::Arc;

use tracing::info;

use crate::astro::{Almanac, Astronomy};
use crate::cache::CacheStore;
use crate::config::SkycastConfig;
use crate::error::SkycastError;
use crate::models::Suggestion;
use crate::models::location::validate_coordinates;
use crate::report::{self, ReportOptions};
use crate::weather::{MetricsEngine, OpenMeteoClient, Thresholds, build_points};

pub struct SkyReportService {
    client: Arc<OpenMeteoClient>,
    engine: MetricsEngine,
    astronomy: Arc<dyn Astronomy>,
}

impl SkyReportService {
    #[must_use]
    pub fn new(client: Arc<OpenMeteoClient>, engine: MetricsEngine, astronomy: Arc<dyn Astronomy>) -> Self {
        Self {
            client,
            engine,
            astronomy,
        }
    }

    /// Wire the default client, cache and almanac from configuration
    pub fn from_config(config: &SkycastConfig) -> crate::Result<Self> {
        let cache = Arc::new(CacheStore::from_config(&config.cache));
        let client = OpenMeteoClient::new(&config.provider, cache)?;
        let engine = MetricsEngine::new(Thresholds::from(&config.thresholds));

        Ok(Self::new(Arc::new(client), engine, Arc::new(Almanac)))
    }

    /// Render the hourly report for a coordinate pair.
    pub async fn report(&self, latitude: f64, longitude: f64, options: &ReportOptions) -> crate::Result<String> {
        validate_coordinates(latitude, longitude)?;

        let payload = self.client.fetch_forecast(latitude, longitude).await?;
        let points = build_points(&payload);
        let rated = self.engine.rate(points, self.astronomy.as_ref());

        info!(
            latitude,
            longitude,
            hours = rated.len(),
            "Rendering sky report"
        );
        Ok(report::render(&rated, self.astronomy.as_ref(), options))
    }

    pub async fn search(&self, query: &str) -> crate::Result<Vec<Suggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SkycastError::validation("Query parameter 'q' is required"));
        }
        self.client.search(query).await
    }

    pub async fn reverse_lookup(&self, latitude: f64, longitude: f64) -> crate::Result<Option<Suggestion>> {
        validate_coordinates(latitude, longitude)?;
        self.client.reverse_lookup(latitude, longitude).await
    }
}
