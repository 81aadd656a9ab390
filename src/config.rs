//! Configuration management for Skycast
//!
//! Handles loading configuration from an optional TOML file layered with
//! environment variables, and validates every setting before use.

use crate::SkycastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Hourly variables requested from Open-Meteo
pub const DEFAULT_HOURLY_PARAMETERS: &str = "temperature_2m,cloud_cover_low,cloud_cover_mid,cloud_cover_high,wind_speed_10m,wind_gusts_10m,wind_speed_200hPa,temperature_500hPa,temperature_850hPa,wind_speed_850hPa,geopotential_height_850hPa,geopotential_height_500hPa";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkycastConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream weather provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// In-memory cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Suitability and seeing thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Open-Meteo endpoints and HTTP client behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_reverse_geocoding_url")]
    pub reverse_geocoding_url: String,
    /// Comma separated hourly variables; part of the forecast cache key
    #[serde(default = "default_hourly_parameters")]
    pub hourly_parameters: String,
    /// Upstream request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
    /// Retries for transient upstream failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Upper bound on the wait between two retries of an upstream call
pub const MAX_RETRY_BACKOFF_SECONDS: u64 = 2;

impl ProviderConfig {
    /// Longest a single upstream lookup can take: every attempt timing out,
    /// plus the longest backoff before each retry.
    #[must_use]
    pub fn worst_case_seconds(&self) -> u64 {
        let attempts = u64::from(self.max_retries) + 1;
        self.timeout_seconds * attempts + MAX_RETRY_BACKOFF_SECONDS * u64::from(self.max_retries)
    }
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Maximum total cache size in MB
    #[serde(default = "default_cache_max_size")]
    pub max_size_mb: u64,
    /// Maximum size of a single entry in KB
    #[serde(default = "default_cache_max_entry")]
    pub max_entry_kb: u64,
}

/// Ceilings for the suitability flag and the jet-stream penalty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Highest acceptable cloud cover for each layer, percent
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,
    /// Highest acceptable 10 m wind and gust speed, km/h
    #[serde(default = "default_max_wind")]
    pub max_wind_kmh: f64,
    /// 200 hPa wind speed above which seeing is penalised, m/s
    #[serde(default = "default_jet_stream_threshold")]
    pub jet_stream_threshold_ms: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_reverse_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/reverse".to_string()
}

fn default_hourly_parameters() -> String {
    DEFAULT_HOURLY_PARAMETERS.to_string()
}

fn default_provider_timeout() -> u64 {
    8
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("Skycast/{}", env!("CARGO_PKG_VERSION"))
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_cache_max_size() -> u64 {
    32
}

fn default_cache_max_entry() -> u64 {
    128
}

fn default_max_cloud_cover() -> f64 {
    25.0
}

fn default_max_wind() -> f64 {
    15.0
}

fn default_jet_stream_threshold() -> f64 {
    22.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            geocoding_url: default_geocoding_url(),
            reverse_geocoding_url: default_reverse_geocoding_url(),
            hourly_parameters: default_hourly_parameters(),
            timeout_seconds: default_provider_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_size_mb: default_cache_max_size(),
            max_entry_kb: default_cache_max_entry(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_cloud_cover: default_max_cloud_cover(),
            max_wind_kmh: default_max_wind(),
            jet_stream_threshold_ms: default_jet_stream_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    #[must_use]
    pub fn max_size_bytes(&self) -> usize {
        usize::try_from(self.max_size_mb * 1024 * 1024).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn max_entry_bytes(&self) -> usize {
        usize::try_from(self.max_entry_kb * 1024).unwrap_or(usize::MAX)
    }
}

impl SkycastConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os("SKYCAST_CONFIG").map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("skycast.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SKYCAST__CACHE__TTL_SECONDS=300 overrides cache.ttl_seconds
        builder = builder.add_source(
            Environment::with_prefix("SKYCAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: SkycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(
                SkycastError::config("Provider timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.provider.max_retries > 10 {
            return Err(SkycastError::config("Provider max retries cannot exceed 10").into());
        }

        // upstream failures must surface as 502 or `{}` before the server gives up
        let upstream_budget = self.provider.worst_case_seconds();
        if self.server.request_timeout_seconds <= upstream_budget {
            return Err(SkycastError::config(format!(
                "Request timeout must exceed the worst-case upstream time of {upstream_budget} seconds (provider timeout x attempts + retry backoff)"
            ))
            .into());
        }

        if self.cache.ttl_seconds == 0 {
            return Err(SkycastError::config("Cache TTL must be greater than zero").into());
        }

        if self.cache.max_size_mb == 0 || self.cache.max_entry_kb == 0 {
            return Err(SkycastError::config("Cache size limits must be greater than zero").into());
        }

        if self.cache.max_entry_bytes() > self.cache.max_size_bytes() {
            return Err(SkycastError::config(
                "Cache max entry size cannot exceed the total cache size",
            )
            .into());
        }

        if !(0.0..=100.0).contains(&self.thresholds.max_cloud_cover) {
            return Err(
                SkycastError::config("Max cloud cover must be between 0 and 100 percent").into(),
            );
        }

        if !(self.thresholds.max_wind_kmh.is_finite() && self.thresholds.max_wind_kmh >= 0.0) {
            return Err(SkycastError::config("Max wind speed must be a positive number").into());
        }

        if !(self.thresholds.jet_stream_threshold_ms.is_finite()
            && self.thresholds.jet_stream_threshold_ms >= 0.0)
        {
            return Err(
                SkycastError::config("Jet stream threshold must be a positive number").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SkycastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [
            &self.provider.forecast_url,
            &self.provider.geocoding_url,
            &self.provider.reverse_geocoding_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SkycastError::config(format!(
                    "Provider URL '{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.provider.hourly_parameters.trim().is_empty() {
            return Err(SkycastError::config("Hourly parameter list cannot be empty").into());
        }

        Ok(())
    }
}
