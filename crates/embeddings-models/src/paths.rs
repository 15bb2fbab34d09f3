//! Model file layout.
//!
//! A numeric model lives in one directory holding the encoder config, the
//! tokenizer and safetensors weights.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ModelError;

/// Required model files
pub const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Paths to model files
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub dir: PathBuf,
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    /// Resolve the model files inside `dir`, failing if any is missing.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ModelError::ModelNotFound(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        if let Some(missing) = MODEL_FILES.iter().find(|f| !dir.join(f).is_file()) {
            return Err(ModelError::ModelNotFound(format!(
                "{} missing from {}",
                missing,
                dir.display()
            )));
        }

        debug!(path = ?dir, "Resolved model files");
        Ok(Self {
            dir: dir.to_path_buf(),
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        })
    }

    /// Model name derived from the directory name
    pub fn model_name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string())
    }
}
