//! Core data models for crop recommendation

use serde::{Deserialize, Serialize};

/// Number of raw input features
pub const NUM_FEATURES: usize = 7;

/// Feature names the trained model is bound to, in column order.
/// Spelling and case must match the training schema exactly.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] =
    ["N", "P", "K_log", "temperature", "humidity", "ph", "rainfall"];

/// Prediction request as accepted over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    /// Raw potassium, log-transformed by the predictor
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
}

impl CropRequest {
    /// Features in the fixed order [N, P, K, temperature, humidity, pH, rainfall]
    pub fn to_values(&self) -> [f64; NUM_FEATURES] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// One ranked crop recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropScore {
    pub crop: String,
    pub probability: f64,
}

/// Validated raw soil and weather features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

/// Transformed row handed to the probability model.
///
/// Field order follows [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K_log")]
    pub k_log: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl FeatureRow {
    /// Values in schema order
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [
            self.n,
            self.p,
            self.k_log,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// Description of the loaded model, served by `GET /model`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub kind: String,
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
}
