pub mod api; // HTTP surface
pub mod config;
pub mod crop; // Crop tables, analysis, soil recommendation
pub mod disease; // Leaf image classification
pub mod report; // PDF reports

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server_on, ApiContext};
use crate::config::{AppConfig, ConfigError};
use crate::crop::SoilRecommender;
use crate::disease::{default_loader, PredictorSlot, ServiceConfig};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("server: {0}")]
    Server(String),
    #[error("signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

/// Start the advisory server and block until Ctrl-C.
///
/// The disease model loads in the background; until it is ready `/health`
/// reports `degraded`. A missing soil model leaves the soil endpoints
/// answering 503 while everything else keeps working.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;

    let predictor = Arc::new(PredictorSlot::new());
    {
        let slot = Arc::clone(&predictor);
        let service_config = ServiceConfig::from(&config);
        tokio::task::spawn_blocking(move || {
            let loader = default_loader();
            // Failure is recorded in the slot and surfaced through /health.
            let _ = slot.load(&service_config, loader.as_ref());
        });
    }

    let soil = match SoilRecommender::load(&config.soil_model_path, &config.soil_metadata_path) {
        Ok(recommender) => {
            tracing::info!(crops = recommender.total_crops(), "Soil recommender ready");
            Some(Arc::new(recommender))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Soil recommender unavailable");
            None
        }
    };

    let ctx = ApiContext::new(predictor, soil);
    let mut server = start_api_server_on(ctx, config.addr)
        .await
        .map_err(RunError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.wait().await;
    Ok(())
}
