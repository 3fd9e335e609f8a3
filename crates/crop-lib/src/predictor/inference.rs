//! ONNX classifier inference using tract
//!
//! Runs a classifier exported to ONNX (for example with skl2onnx and
//! `zipmap=False`) through tract-onnx. ONNX graphs do not carry the
//! feature-name binding in a portable way, so class labels and feature names
//! come from a sidecar manifest next to the model file.

use super::ProbabilityModel;
use crate::error::{PredictError, PredictResult};
use crate::models::{FeatureRow, NUM_FEATURES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Sidecar manifest describing an ONNX classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxManifest {
    /// Class labels in the order of the probability output columns
    pub classes: Vec<String>,
    /// Feature names the model was trained against
    pub feature_names: Vec<String>,
    /// Index of the probability tensor among the graph outputs
    #[serde(default = "default_probability_output")]
    pub probability_output: usize,
}

fn default_probability_output() -> usize {
    // skl2onnx emits [label, probabilities]
    1
}

impl OnnxManifest {
    /// Sidecar location for a model file: `crop_model.onnx` -> `crop_model.classes.json`
    pub fn path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("classes.json")
    }

    pub fn from_json(bytes: &[u8]) -> PredictResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            PredictError::model_unavailable(format!("failed to parse model manifest: {}", e))
        })
    }
}

/// ONNX-based classifier
pub struct OnnxClassifier {
    plan: TractModel,
    manifest: OnnxManifest,
}

impl OnnxClassifier {
    /// Parse and optimize an ONNX model from bytes
    pub fn new(model_bytes: &[u8], manifest: OnnxManifest) -> PredictResult<Self> {
        if manifest.classes.is_empty() {
            return Err(PredictError::model_unavailable("manifest lists no classes"));
        }
        let plan = Self::load_model(model_bytes)
            .map_err(|e| PredictError::model_unavailable(format!("{:#}", e)))?;

        Ok(Self { plan, manifest })
    }

    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")
    }

    fn row_to_tensor(row: &FeatureRow) -> PredictResult<Tensor> {
        let data: Vec<f32> = row.values().iter().map(|v| *v as f32).collect();
        tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .map(Tensor::from)
            .map_err(|e| PredictError::Internal(format!("failed to build input tensor: {}", e)))
    }

    fn run(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        let input = Self::row_to_tensor(row)?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let output = outputs
            .get(self.manifest.probability_output)
            .with_context(|| {
                format!(
                    "model has {} outputs, probability output index is {}",
                    outputs.len(),
                    self.manifest.probability_output
                )
            })?;

        let probabilities = output.cast_to::<f32>()?;
        let view = probabilities.to_array_view::<f32>()?;
        Ok(view.iter().map(|p| *p as f64).collect())
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn classes(&self) -> &[String] {
        &self.manifest.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.manifest.feature_names
    }

    fn predict_proba(&self, row: &FeatureRow) -> PredictResult<Vec<f64>> {
        let start = Instant::now();

        let probabilities = self
            .run(row)
            .map_err(|e| PredictError::model_unavailable(format!("scoring failed: {:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(probabilities)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureVector, FEATURE_NAMES};
    use crate::predictor::{softmax, CropPredictor};
    use prost::Message;
    use std::sync::Arc;
    use tract_onnx::pb::{
        attribute_proto::AttributeType, tensor_proto::DataType, tensor_shape_proto, type_proto,
        AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
        TensorShapeProto, TypeProto, ValueInfoProto,
    };

    const ONNX_CLASSES: [&str; 4] = ["chickpea", "maize", "rice", "cotton"];

    /// Weights `[7, 4]`, row-major: only N and rainfall contribute
    const WEIGHTS: [f32; NUM_FEATURES * 4] = [
        0.02, 0.01, 0.0, 0.0, // N
        0.0, 0.0, 0.0, 0.0, // P
        0.0, 0.0, 0.0, 0.0, // K_log
        0.0, 0.0, 0.0, 0.0, // temperature
        0.0, 0.0, 0.0, 0.0, // humidity
        0.0, 0.0, 0.0, 0.0, // ph
        0.0, 0.005, 0.01, 0.0, // rainfall
    ];

    fn int_attr(name: &str, value: i64) -> AttributeProto {
        AttributeProto {
            name: name.to_string(),
            r#type: AttributeType::Int as i32,
            i: value,
            ..Default::default()
        }
    }

    fn node(
        op_type: &str,
        inputs: &[&str],
        output: &str,
        attribute: Vec<AttributeProto>,
    ) -> NodeProto {
        NodeProto {
            op_type: op_type.to_string(),
            name: output.to_string(),
            input: inputs.iter().map(|s| s.to_string()).collect(),
            output: vec![output.to_string()],
            attribute,
            ..Default::default()
        }
    }

    /// Linear classifier laid out like a skl2onnx export: outputs `[label, probabilities]`
    fn linear_classifier_onnx() -> Vec<u8> {
        let dim = |n: i64| tensor_shape_proto::Dimension {
            value: Some(tensor_shape_proto::dimension::Value::DimValue(n)),
            ..Default::default()
        };
        let input = ValueInfoProto {
            name: "x".to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: DataType::Float as i32,
                    shape: Some(TensorShapeProto {
                        dim: vec![dim(1), dim(NUM_FEATURES as i64)],
                    }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        };
        let output = |name: &str| ValueInfoProto {
            name: name.to_string(),
            ..Default::default()
        };

        let graph = GraphProto {
            name: "crop_linear".to_string(),
            node: vec![
                node("MatMul", &["x", "W"], "logits", vec![]),
                node("Softmax", &["logits"], "probabilities", vec![int_attr("axis", 1)]),
                node(
                    "ArgMax",
                    &["logits"],
                    "label",
                    vec![int_attr("axis", 1), int_attr("keepdims", 0)],
                ),
            ],
            initializer: vec![TensorProto {
                name: "W".to_string(),
                dims: vec![NUM_FEATURES as i64, 4],
                data_type: DataType::Float as i32,
                float_data: WEIGHTS.to_vec(),
                ..Default::default()
            }],
            input: vec![input],
            output: vec![output("label"), output("probabilities")],
            ..Default::default()
        };

        ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(graph),
            ..Default::default()
        }
        .encode_to_vec()
    }

    fn linear_manifest() -> OnnxManifest {
        OnnxManifest {
            classes: ONNX_CLASSES.iter().map(|s| s.to_string()).collect(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            probability_output: 1,
        }
    }

    fn sample_row() -> FeatureRow {
        FeatureVector::from_slice(&[90.0, 42.0, 43.0, 20.87, 82.0, 6.5, 202.93])
            .unwrap()
            .to_row()
    }

    #[test]
    fn test_manifest_path_for_model() {
        let path = OnnxManifest::path_for(Path::new("/srv/model/crop_model.onnx"));
        assert_eq!(path, PathBuf::from("/srv/model/crop_model.classes.json"));
    }

    #[test]
    fn test_manifest_default_probability_output() {
        let json = br#"{"classes": ["rice", "maize"], "feature_names": ["N"]}"#;
        let manifest = OnnxManifest::from_json(json).unwrap();
        assert_eq!(manifest.probability_output, 1);
        assert_eq!(manifest.classes, vec!["rice", "maize"]);
    }

    #[test]
    fn test_invalid_onnx_bytes_rejected() {
        let manifest = OnnxManifest {
            classes: vec!["rice".to_string()],
            feature_names: vec![],
            probability_output: 1,
        };
        // Unterminated varint: fails protobuf decoding
        let result = OnnxClassifier::new(&[0xff; 16], manifest);
        assert!(matches!(result, Err(PredictError::ModelUnavailable(_))));
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let manifest = OnnxManifest {
            classes: vec![],
            feature_names: vec![],
            probability_output: 1,
        };
        assert!(OnnxClassifier::new(&[], manifest).is_err());
    }

    #[test]
    fn test_onnx_classifier_reads_probability_output() {
        let classifier = OnnxClassifier::new(&linear_classifier_onnx(), linear_manifest()).unwrap();
        assert_eq!(classifier.kind(), "onnx");

        let row = sample_row();
        let probs = classifier.predict_proba(&row).unwrap();
        assert_eq!(probs.len(), ONNX_CLASSES.len());

        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "probabilities sum to {}", sum);

        let values = row.values();
        let logits: Vec<f64> = (0..4)
            .map(|c| {
                (0..NUM_FEATURES)
                    .map(|f| values[f] * WEIGHTS[f * 4 + c] as f64)
                    .sum()
            })
            .collect();
        for (got, want) in probs.iter().zip(softmax(&logits)) {
            assert!((got - want).abs() < 1e-4, "got {}, want {}", got, want);
        }
    }

    #[test]
    fn test_label_output_is_not_read_as_probabilities() {
        let manifest = OnnxManifest {
            probability_output: 0,
            ..linear_manifest()
        };
        let classifier = OnnxClassifier::new(&linear_classifier_onnx(), manifest).unwrap();

        // Output 0 is the single argmax label, not one column per class
        let probs = classifier.predict_proba(&sample_row()).unwrap();
        assert_eq!(probs.len(), 1);
        assert_eq!(probs[0], 2.0);
    }

    #[test]
    fn test_missing_probability_output_is_unavailable() {
        let manifest = OnnxManifest {
            probability_output: 2,
            ..linear_manifest()
        };
        let classifier = OnnxClassifier::new(&linear_classifier_onnx(), manifest).unwrap();

        let err = classifier.predict_proba(&sample_row()).unwrap_err();
        assert!(matches!(err, PredictError::ModelUnavailable(_)));
        assert!(err.to_string().contains("2 outputs"));
    }

    #[test]
    fn test_onnx_classifier_ranks_through_predictor() {
        let classifier = OnnxClassifier::new(&linear_classifier_onnx(), linear_manifest()).unwrap();
        let predictor = CropPredictor::new(Arc::new(classifier)).unwrap();

        let ranked = predictor
            .predict_top_crops(&[90.0, 42.0, 43.0, 20.87, 82.0, 6.5, 202.93])
            .unwrap();

        assert_eq!(ranked.len(), 4);
        let crops: Vec<&str> = ranked.iter().map(|s| s.crop.as_str()).collect();
        // logits: chickpea 1.8, maize 1.91465, rice 2.0293, cotton 0
        assert_eq!(crops, ["rice", "maize", "chickpea", "cotton"]);
        assert!(ranked.windows(2).all(|w| w[0].probability >= w[1].probability));
    }
}
