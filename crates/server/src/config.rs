//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Model location relative to the directory holding the server binary
pub const DEFAULT_MODEL_PATH: &str = "model/crop_model.onnx";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model artifact override (`.onnx` or `.json`)
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Expected SHA256 of the model artifact, hex encoded
    #[serde(default)]
    pub model_sha256: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: None,
            model_sha256: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `crop-server` file and `CROP_*` environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("crop-server").required(false))
            .add_source(config::Environment::with_prefix("CROP"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model path to load: the override if set, else the default next to the binary
    pub fn resolve_model_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.model_path {
            return Ok(path.clone());
        }

        let exe = std::env::current_exe().context("Failed to locate server executable")?;
        let base = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(default_model_path(base))
    }
}

/// Default model path under `base`
pub fn default_model_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_MODEL_PATH)
}
