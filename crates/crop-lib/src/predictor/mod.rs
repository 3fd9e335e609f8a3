//! Crop prediction engine

mod features;
#[cfg(any(test, feature = "testing"))]
mod fixed;
mod inference;
mod linear;
mod loader;
mod ranking;
mod service;

pub use features::{k_log, RAW_FEATURE_ORDER};
#[cfg(any(test, feature = "testing"))]
pub use fixed::FixedModel;
pub use inference::{OnnxClassifier, OnnxManifest};
pub use linear::{softmax, SoftmaxArtifact, SoftmaxClassifier, StandardScaler};
pub use loader::{compute_checksum, load_model, MAX_MODEL_SIZE};
pub use ranking::{round_probability, top_k, PROBABILITY_DECIMALS, TOP_K};
pub use service::CropPredictor;

use crate::error::PredictResult;
use crate::models::FeatureRow;

/// Trained multiclass classifier exposing per-class probabilities
pub trait ProbabilityModel: Send + Sync {
    /// Known class labels, in the order `predict_proba` reports them
    fn classes(&self) -> &[String];

    /// Feature names the model was trained against
    fn feature_names(&self) -> &[String];

    /// Score a single row, one probability per class
    fn predict_proba(&self, row: &FeatureRow) -> PredictResult<Vec<f64>>;

    /// Backend label for logs and metrics
    fn kind(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::models::FEATURE_NAMES;
    use serde_json::json;

    /// Six-class softmax artifact whose weights favour rice under wet conditions
    pub fn softmax_artifact_json() -> String {
        json!({
            "classes": ["apple", "chickpea", "cotton", "maize", "mango", "rice"],
            "feature_names": FEATURE_NAMES,
            "coefficients": [
                [0.00, 0.05, 0.10, -0.02, -0.01, 0.0, -0.01],
                [0.01, 0.02, 0.05, -0.01, -0.03, 0.1, -0.02],
                [0.03, 0.01, 0.00, 0.02, 0.00, 0.0, -0.005],
                [0.02, 0.01, 0.00, 0.01, 0.01, 0.0, -0.003],
                [0.00, 0.01, 0.05, 0.03, 0.00, 0.0, -0.004],
                [0.02, 0.00, 0.00, 0.00, 0.02, 0.0, 0.02]
            ],
            "intercepts": [0.0, 0.0, 0.0, 0.0, 0.0, -1.0],
            "scaler": null
        })
        .to_string()
    }
}
