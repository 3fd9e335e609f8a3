//! Crop predictor: validation, transform, scoring and ranking

use super::ranking::{top_k, TOP_K};
use super::ProbabilityModel;
use crate::error::{PredictError, PredictResult};
use crate::models::{CropRequest, CropScore, FeatureVector, ModelInfo, FEATURE_NAMES};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Maps soil and weather features to the most probable crops.
///
/// Holds a read-only model shared by all callers; no call mutates state, so
/// a single instance can serve concurrent requests without locking.
#[derive(Clone)]
pub struct CropPredictor {
    model: Arc<dyn ProbabilityModel>,
}

impl std::fmt::Debug for CropPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropPredictor")
            .field("kind", &self.model.kind())
            .field("classes", &self.model.classes().len())
            .finish()
    }
}

impl CropPredictor {
    /// Wrap a loaded model after checking its schema binding
    pub fn new(model: Arc<dyn ProbabilityModel>) -> PredictResult<Self> {
        let names = model.feature_names();
        if names.len() != FEATURE_NAMES.len() || names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b) {
            return Err(PredictError::model_unavailable(format!(
                "model feature names {:?} do not match expected {:?}",
                names, FEATURE_NAMES
            )));
        }

        if model.classes().len() < TOP_K {
            return Err(PredictError::model_unavailable(format!(
                "model knows {} classes, at least {} required",
                model.classes().len(),
                TOP_K
            )));
        }

        Ok(Self { model })
    }

    /// Rank the top crops for `[N, P, K, temperature, humidity, pH, rainfall]`
    pub fn predict_top_crops(&self, features: &[f64]) -> PredictResult<Vec<CropScore>> {
        let vector = FeatureVector::from_slice(features)?;
        self.predict_vector(&vector)
    }

    /// Same as [`predict_top_crops`](Self::predict_top_crops) for untyped JSON input
    pub fn predict_values(&self, values: &[Value]) -> PredictResult<Vec<CropScore>> {
        let vector = FeatureVector::from_json_values(values)?;
        self.predict_vector(&vector)
    }

    /// Predict from a named HTTP request
    pub fn predict(&self, request: &CropRequest) -> PredictResult<Vec<CropScore>> {
        let vector = FeatureVector::try_from(request)?;
        self.predict_vector(&vector)
    }

    fn predict_vector(&self, vector: &FeatureVector) -> PredictResult<Vec<CropScore>> {
        let row = vector.to_row();
        let probabilities = self.model.predict_proba(&row)?;
        let ranked = top_k(self.model.classes(), &probabilities, TOP_K)?;

        debug!(
            k_log = row.k_log,
            top_crop = ranked.first().map(|c| c.crop.as_str()).unwrap_or_default(),
            "Ranked crop probabilities"
        );

        Ok(ranked)
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn classes(&self) -> &[String] {
        self.model.classes()
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            kind: self.model.kind().to_string(),
            classes: self.model.classes().to_vec(),
            feature_names: self.model.feature_names().to_vec(),
        }
    }
}
