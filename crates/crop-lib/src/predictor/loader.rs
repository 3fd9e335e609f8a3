//! Model artifact loading
//!
//! The artifact is read once at startup. Optional SHA256 validation runs
//! before parsing so a corrupted or swapped file never reaches the backend.

use super::inference::{OnnxClassifier, OnnxManifest};
use super::linear::SoftmaxClassifier;
use super::ProbabilityModel;
use crate::error::{PredictError, PredictResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Maximum accepted artifact size (256MB)
pub const MAX_MODEL_SIZE: usize = 256 * 1024 * 1024;

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn read_artifact(path: &Path) -> PredictResult<Vec<u8>> {
    fs::read(path).map_err(|e| {
        PredictError::model_unavailable(format!("failed to read {}: {}", path.display(), e))
    })
}

/// Load a probability model from disk.
///
/// The backend is picked from the file extension: `.onnx` runs through
/// tract and needs a `<stem>.classes.json` manifest alongside it, `.json`
/// is a softmax classifier artifact.
pub fn load_model(
    path: &Path,
    expected_sha256: Option<&str>,
) -> PredictResult<Arc<dyn ProbabilityModel>> {
    info!(path = %path.display(), "Loading model");

    let bytes = read_artifact(path)?;

    if bytes.len() > MAX_MODEL_SIZE {
        return Err(PredictError::model_unavailable(format!(
            "model size {} exceeds maximum {}",
            bytes.len(),
            MAX_MODEL_SIZE
        )));
    }

    let checksum = compute_checksum(&bytes);
    if let Some(expected) = expected_sha256 {
        if !checksum.eq_ignore_ascii_case(expected.trim()) {
            return Err(PredictError::model_unavailable(format!(
                "checksum mismatch: expected {}, got {}",
                expected, checksum
            )));
        }
        info!(checksum = %checksum, "Model checksum validated");
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let model: Arc<dyn ProbabilityModel> = match extension.as_deref() {
        Some("onnx") => {
            let manifest_path = OnnxManifest::path_for(path);
            let manifest = OnnxManifest::from_json(&read_artifact(&manifest_path)?)?;
            Arc::new(OnnxClassifier::new(&bytes, manifest)?)
        }
        Some("json") => Arc::new(SoftmaxClassifier::from_json(&bytes)?),
        other => {
            return Err(PredictError::model_unavailable(format!(
                "unsupported model format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            )))
        }
    };

    info!(
        path = %path.display(),
        kind = model.kind(),
        classes = model.classes().len(),
        size_bytes = bytes.len(),
        checksum = %checksum,
        "Model loaded successfully"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::testing::softmax_artifact_json;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"crop model");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"crop model"));
    }

    #[test]
    fn test_load_softmax_model() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "crop_model.json", softmax_artifact_json().as_bytes());

        let model = load_model(&path, None).unwrap();
        assert_eq!(model.kind(), "softmax");
        assert_eq!(model.classes().len(), 6);
    }

    #[test]
    fn test_checksum_validated_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let contents = softmax_artifact_json();
        let path = write_file(&dir, "crop_model.json", contents.as_bytes());
        let expected = compute_checksum(contents.as_bytes()).to_uppercase();

        assert!(load_model(&path, Some(&expected)).is_ok());
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "crop_model.json", softmax_artifact_json().as_bytes());

        let err = load_model(&path, Some(&"0".repeat(64))).err().unwrap();
        assert!(matches!(err, PredictError::ModelUnavailable(msg) if msg.contains("checksum")));
    }

    #[test]
    fn test_missing_file_is_model_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = load_model(&dir.path().join("absent.onnx"), None).err().unwrap();
        assert!(matches!(err, PredictError::ModelUnavailable(_)));
    }

    #[test]
    fn test_onnx_without_manifest_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "crop_model.onnx", &[0xff; 16]);

        let err = load_model(&path, None).err().unwrap();
        assert!(matches!(err, PredictError::ModelUnavailable(msg) if msg.contains("classes.json")));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "model.pkl", b"\x80\x04");

        let err = load_model(&path, None).err().unwrap();
        assert!(matches!(err, PredictError::ModelUnavailable(msg) if msg.contains("unsupported")));
    }
}
