//! Feature validation and transformation
//!
//! Raw input arrives as an ordered list of seven numbers
//! `[N, P, K, temperature, humidity, pH, rainfall]`. Potassium is replaced by
//! its natural logarithm before scoring, matching the training schema.

use crate::error::{PredictError, PredictResult};
use crate::models::{CropRequest, FeatureRow, FeatureVector, NUM_FEATURES};
use serde_json::Value;

/// Human-readable order of the raw input features
pub const RAW_FEATURE_ORDER: &str = "[N, P, K, Temperature, Humidity, pH, Rainfall]";

/// Log-transform raw potassium.
///
/// Non-positive K maps to 0 instead of failing on the log domain. This is
/// the current fallback policy, not a continuous extrapolation.
pub fn k_log(k: f64) -> f64 {
    if k > 0.0 {
        k.ln()
    } else {
        0.0
    }
}

impl FeatureVector {
    /// Build from an ordered slice of exactly seven finite values
    pub fn from_slice(values: &[f64]) -> PredictResult<Self> {
        if values.len() != NUM_FEATURES {
            return Err(PredictError::invalid_input(format!(
                "Input must have {} features: {}, got {}",
                NUM_FEATURES,
                RAW_FEATURE_ORDER,
                values.len()
            )));
        }

        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::invalid_input(format!(
                "feature at position {} is not a finite number",
                pos
            )));
        }

        Ok(Self {
            n: values[0],
            p: values[1],
            k: values[2],
            temperature: values[3],
            humidity: values[4],
            ph: values[5],
            rainfall: values[6],
        })
    }

    /// Build from loosely typed JSON values, rejecting non-numeric elements
    pub fn from_json_values(values: &[Value]) -> PredictResult<Self> {
        if values.len() != NUM_FEATURES {
            return Err(PredictError::invalid_input(format!(
                "Input must have {} features: {}, got {}",
                NUM_FEATURES,
                RAW_FEATURE_ORDER,
                values.len()
            )));
        }

        let numbers = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64().ok_or_else(|| {
                    PredictError::invalid_input(format!(
                        "feature at position {} is not numeric: {}",
                        i, v
                    ))
                })
            })
            .collect::<PredictResult<Vec<f64>>>()?;

        Self::from_slice(&numbers)
    }

    /// Apply the K transform and bind values to the model schema
    pub fn to_row(&self) -> FeatureRow {
        FeatureRow {
            n: self.n,
            p: self.p,
            k_log: k_log(self.k),
            temperature: self.temperature,
            humidity: self.humidity,
            ph: self.ph,
            rainfall: self.rainfall,
        }
    }
}

impl TryFrom<&CropRequest> for FeatureVector {
    type Error = PredictError;

    fn try_from(request: &CropRequest) -> PredictResult<Self> {
        Self::from_slice(&request.to_values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: [f64; 7] = [90.0, 42.0, 43.0, 20.87, 82.00, 6.50, 202.93];

    #[test]
    fn test_k_log_positive() {
        assert!((k_log(43.0) - 43f64.ln()).abs() < 1e-12);
        assert_eq!(k_log(1.0), 0.0);
    }

    #[test]
    fn test_k_log_non_positive_falls_back_to_zero() {
        // Known edge case: current policy, not a verified modelling choice.
        assert_eq!(k_log(0.0), 0.0);
        assert_eq!(k_log(-5.0), 0.0);
    }

    #[test]
    fn test_from_slice_accepts_seven_values() {
        let fv = FeatureVector::from_slice(&SAMPLE).unwrap();
        assert_eq!(fv.n, 90.0);
        assert_eq!(fv.k, 43.0);
        assert_eq!(fv.rainfall, 202.93);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        for len in [0, 6, 8] {
            let values = vec![1.0; len];
            let err = FeatureVector::from_slice(&values).unwrap_err();
            assert!(matches!(err, PredictError::InvalidInput(_)), "len {}", len);
        }
    }

    #[test]
    fn test_from_slice_rejects_non_finite() {
        let mut values = SAMPLE;
        values[4] = f64::NAN;
        assert!(matches!(
            FeatureVector::from_slice(&values),
            Err(PredictError::InvalidInput(_))
        ));

        values[4] = f64::INFINITY;
        assert!(FeatureVector::from_slice(&values).is_err());
    }

    #[test]
    fn test_from_json_values_rejects_string() {
        let values = vec![
            json!(90),
            json!(42),
            json!("43"),
            json!(20.87),
            json!(82.0),
            json!(6.5),
            json!(202.93),
        ];
        let err = FeatureVector::from_json_values(&values).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(msg) if msg.contains("position 2")));
    }

    #[test]
    fn test_from_json_values_accepts_integers_and_floats() {
        let values: Vec<Value> = SAMPLE.iter().map(|v| json!(v)).collect();
        let fv = FeatureVector::from_json_values(&values).unwrap();
        assert_eq!(fv, FeatureVector::from_slice(&SAMPLE).unwrap());
    }

    #[test]
    fn test_to_row_substitutes_k_log_only() {
        let row = FeatureVector::from_slice(&SAMPLE).unwrap().to_row();
        let values = row.values();

        assert_eq!(values[0], 90.0);
        assert_eq!(values[1], 42.0);
        assert!((values[2] - 43f64.ln()).abs() < 1e-12);
        assert_eq!(&values[3..], &SAMPLE[3..]);
    }
}
