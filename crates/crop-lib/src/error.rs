//! Error taxonomy for crop prediction

use thiserror::Error;

/// Errors surfaced by the predictor and model loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Caller supplied a malformed feature vector
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model artifact missing, corrupt or failing to score
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Any other unexpected failure during prediction
    #[error("prediction failed: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidInput(_) => "invalid_input",
            PredictError::ModelUnavailable(_) => "model_unavailable",
            PredictError::Internal(_) => "internal",
        }
    }
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;
