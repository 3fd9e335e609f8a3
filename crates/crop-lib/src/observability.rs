//! Observability for the crop service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction and error counts, model info)
//! - Structured JSON event logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge_vec,
    Histogram, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounterVec,
    model_info: IntGaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "crop_service_prediction_latency_seconds",
                "Time spent validating, scoring and ranking a prediction request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "crop_service_predictions_total",
                "Total number of successful crop predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "crop_service_prediction_errors_total",
                "Total number of failed crop predictions by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            model_info: register_int_gauge_vec!(
                "crop_service_model_info",
                "Information about the loaded classification model",
                &["kind", "classes"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a handle, registering the metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_model_info(&self, kind: &str, classes: usize) {
        let classes = classes.to_string();
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[kind, classes.as_str()])
            .set(1);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            model_path = %model_path,
            "Crop service starting"
        );
    }

    pub fn log_model_loaded(&self, kind: &str, classes: usize, elapsed_ms: u128) {
        info!(
            event = "model_loaded",
            service = %self.service,
            kind = %kind,
            classes = classes,
            elapsed_ms = elapsed_ms,
            "Model loaded successfully"
        );
    }

    pub fn log_prediction(&self, top_crop: &str, probability: f64, elapsed_us: u128) {
        info!(
            event = "prediction_served",
            service = %self.service,
            top_crop = %top_crop,
            probability = probability,
            elapsed_us = elapsed_us,
            "Served crop prediction"
        );
    }

    pub fn log_prediction_failed(&self, kind: &str, error: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            kind = %kind,
            error = %error,
            "Prediction failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Crop service shutting down"
        );
    }
}
