//! Fixed-output model for substituting the trained artifact

use super::ProbabilityModel;
use crate::error::{PredictError, PredictResult};
use crate::models::{FeatureRow, FEATURE_NAMES};

/// Model returning the same probabilities for every row, or a fixed error
#[derive(Debug, Clone)]
pub struct FixedModel {
    classes: Vec<String>,
    feature_names: Vec<String>,
    outcome: Result<Vec<f64>, String>,
}

impl FixedModel {
    pub fn new(classes: &[&str], probabilities: &[f64]) -> Self {
        Self {
            classes: classes.iter().map(|s| s.to_string()).collect(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            outcome: Ok(probabilities.to_vec()),
        }
    }

    /// A model whose scoring always fails with `message`
    pub fn failing(classes: &[&str], message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            ..Self::new(classes, &[])
        }
    }

    pub fn with_feature_names(mut self, names: &[&str]) -> Self {
        self.feature_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl ProbabilityModel for FixedModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, _row: &FeatureRow) -> PredictResult<Vec<f64>> {
        self.outcome
            .clone()
            .map_err(PredictError::ModelUnavailable)
    }

    fn kind(&self) -> &'static str {
        "fixed"
    }
}
