//! Multinomial logistic regression backend
//!
//! Scores a row as `softmax(W·x + b)`, optionally after standard scaling.
//! The artifact is a JSON export of a fitted linear classifier.

use super::ProbabilityModel;
use crate::error::{PredictError, PredictResult};
use crate::models::{FeatureRow, NUM_FEATURES};
use serde::{Deserialize, Serialize};

/// Standard scaler parameters applied before the linear layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Serialized form of a softmax classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxArtifact {
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
    /// One row of `NUM_FEATURES` weights per class
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

/// Softmax classifier loaded from a JSON artifact
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    artifact: SoftmaxArtifact,
}

impl SoftmaxClassifier {
    /// Validate artifact dimensions and build the classifier
    pub fn new(artifact: SoftmaxArtifact) -> PredictResult<Self> {
        let num_classes = artifact.classes.len();

        if num_classes == 0 {
            return Err(PredictError::model_unavailable("model has no classes"));
        }
        if artifact.feature_names.len() != NUM_FEATURES {
            return Err(PredictError::model_unavailable(format!(
                "model expects {} features, service provides {}",
                artifact.feature_names.len(),
                NUM_FEATURES
            )));
        }
        if artifact.coefficients.len() != num_classes || artifact.intercepts.len() != num_classes {
            return Err(PredictError::model_unavailable(format!(
                "coefficient shape does not match {} classes",
                num_classes
            )));
        }
        if artifact.coefficients.iter().any(|w| w.len() != NUM_FEATURES) {
            return Err(PredictError::model_unavailable(format!(
                "every coefficient row must have {} weights",
                NUM_FEATURES
            )));
        }
        if let Some(scaler) = &artifact.scaler {
            if scaler.mean.len() != NUM_FEATURES || scaler.scale.len() != NUM_FEATURES {
                return Err(PredictError::model_unavailable("scaler shape mismatch"));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(PredictError::model_unavailable("scaler has zero or non-finite scale"));
            }
        }

        Ok(Self { artifact })
    }

    /// Parse a JSON artifact
    pub fn from_json(bytes: &[u8]) -> PredictResult<Self> {
        let artifact: SoftmaxArtifact = serde_json::from_slice(bytes)
            .map_err(|e| PredictError::model_unavailable(format!("failed to parse model: {}", e)))?;
        Self::new(artifact)
    }

    fn scaled(&self, row: &FeatureRow) -> [f64; NUM_FEATURES] {
        let mut x = row.values();
        if let Some(scaler) = &self.artifact.scaler {
            for (i, v) in x.iter_mut().enumerate() {
                *v = (*v - scaler.mean[i]) / scaler.scale[i];
            }
        }
        x
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl ProbabilityModel for SoftmaxClassifier {
    fn classes(&self) -> &[String] {
        &self.artifact.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    fn predict_proba(&self, row: &FeatureRow) -> PredictResult<Vec<f64>> {
        let x = self.scaled(row);

        let logits: Vec<f64> = self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(w, b)| w.iter().zip(&x).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect();

        if logits.iter().any(|z| !z.is_finite()) {
            return Err(PredictError::model_unavailable("non-finite logit during scoring"));
        }

        Ok(softmax(&logits))
    }

    fn kind(&self) -> &'static str {
        "softmax"
    }
}
