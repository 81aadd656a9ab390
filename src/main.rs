use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use skycast::config::LoggingConfig;
use skycast::{SkycastConfig, VERSION, web};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("skycast={0},tower_http={0}", logging.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = SkycastConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!(version = VERSION, "Starting Skycast");
    web::run(&config).await
}
