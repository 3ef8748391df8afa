//! Error types for external tool invocation

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("IO error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed JSON in {path}: {message}")]
    MalformedJson { path: String, message: String },

    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("No {0} command configured")]
    EmptyCommand(&'static str),

    #[error("Evaluator exited with {}: {}", exit_label(.code), .stderr)]
    EvaluatorFailed { code: Option<i32>, stderr: String },

    #[error("Trainer exited with {}", exit_label(.code))]
    TrainerFailed { code: Option<i32> },

    #[error("Model command exited with {}: {}", exit_label(.code), .stderr)]
    ModelFailed { code: Option<i32>, stderr: String },

    #[error("Configuration '{0}' not found")]
    UnknownProfile(String),

    #[error("Configuration '{0}' is not a JSON object")]
    InvalidProfile(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl EvalError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn spawn(program: &str, err: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_string(),
            message: err.to_string(),
        }
    }
}
