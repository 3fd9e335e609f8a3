//! HTTP API: crop prediction, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use crop_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    CropPredictor, CropRequest, CropScore, ModelInfo, PredictError,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<CropPredictor>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: Arc<CropPredictor>,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            metrics,
            logger,
        }
    }
}

/// Prediction failure rendered as `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError(pub PredictError);

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PredictError::invalid_input(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PredictError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PredictError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

/// Rank the top crops for one set of soil and weather readings
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CropRequest>, JsonRejection>,
) -> Result<Json<Vec<CropScore>>, ApiError> {
    let start = Instant::now();

    let result = payload
        .map_err(ApiError::from)
        .and_then(|Json(request)| state.predictor.predict(&request).map_err(ApiError::from));

    let elapsed = start.elapsed();
    state.metrics.observe_prediction_latency(elapsed.as_secs_f64());

    match result {
        Ok(ranked) => {
            state.metrics.inc_predictions();
            if state.health_registry.component_status(components::PREDICTOR).await
                == Some(ComponentStatus::Degraded)
            {
                state.health_registry.set_healthy(components::PREDICTOR).await;
                info!(component = components::PREDICTOR, "Predictor recovered");
            }
            if let Some(top) = ranked.first() {
                state
                    .logger
                    .log_prediction(&top.crop, top.probability, elapsed.as_micros());
            }
            Ok(Json(ranked))
        }
        Err(err) => {
            state.metrics.inc_prediction_errors(err.0.kind());
            state
                .logger
                .log_prediction_failed(err.0.kind(), &err.0.to_string());
            if let PredictError::ModelUnavailable(message) = &err.0 {
                state
                    .health_registry
                    .set_degraded(components::PREDICTOR, message.clone())
                    .await;
            }
            Err(err)
        }
    }
}

/// Describe the loaded model
async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.predictor.model_info())
}

/// 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// 200 once the model is loaded, 503 otherwise
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the API until ctrl-c
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
