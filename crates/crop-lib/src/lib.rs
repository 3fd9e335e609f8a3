//! Crop recommendation library
//!
//! This crate provides the core functionality for:
//! - Validating and transforming soil/weather features
//! - Scoring them with a preloaded probability model (ONNX or softmax)
//! - Ranking the most probable crops
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use error::{PredictError, PredictResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{load_model, CropPredictor, ProbabilityModel};
