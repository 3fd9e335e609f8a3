//! Crop server - top-4 crop recommendations over HTTP
//!
//! Loads the trained model once at startup and serves predictions until
//! interrupted. A missing or corrupt model aborts startup.

use anyhow::{Context, Result};
use crop_lib::{
    health::{components, HealthRegistry},
    load_model,
    observability::{ServiceMetrics, StructuredLogger},
    CropPredictor,
};
use crop_server::{api, config::ServerConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "crop-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    let model_path = config.resolve_model_path()?;

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(SERVER_VERSION, &model_path.display().to_string());

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::PREDICTOR).await;

    let start = Instant::now();
    let predictor = load_model(&model_path, config.model_sha256.as_deref())
        .and_then(CropPredictor::new)
        .map_err(|e| {
            error!(path = %model_path.display(), error = %e, "Failed to load model");
            e
        })
        .with_context(|| format!("Cannot serve without a model at {}", model_path.display()))?;

    logger.log_model_loaded(
        predictor.model_kind(),
        predictor.classes().len(),
        start.elapsed().as_millis(),
    );

    let metrics = ServiceMetrics::new();
    metrics.set_model_info(predictor.model_kind(), predictor.classes().len());

    health_registry.set_model_loaded(true).await;

    let app_state = Arc::new(api::AppState::new(
        Arc::new(predictor),
        health_registry,
        metrics,
        logger.clone(),
    ));

    api::serve(&config.bind_addr(), app_state).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
