//! Dataset pipeline error types

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed JSON in {path}: {message}")]
    MalformedJson { path: String, message: String },

    #[error("Directory not found: {0}")]
    MissingDirectory(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl DatasetError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(path: &Path, err: serde_json::Error) -> Self {
        Self::MalformedJson {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
