//! External evaluation harness wrapper
//!
//! The harness is a script run through an interpreter with
//! `--gold --pred --db --table --etype` flags. Its stdout is stored verbatim
//! under the results directory; nothing is written when it fails.

use crate::error::EvalError;
use crate::scores::lines_from_header;
use sqlprep_core::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Inputs of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    /// Gold queries, one per line
    pub gold: PathBuf,

    /// Predicted queries, one per line
    pub pred: PathBuf,

    /// Database root
    pub db: PathBuf,

    /// Table metadata JSON
    pub table: PathBuf,
}

/// Captured result of an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A successful evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// File holding the harness stdout
    pub results_path: PathBuf,

    pub output: ProcessOutput,
}

impl Evaluation {
    /// Score table lines, starting at the column header
    pub fn score_lines(&self) -> Option<Vec<&str>> {
        lines_from_header(&self.output.stdout)
    }
}

/// Launches the evaluation harness
#[derive(Debug, Clone)]
pub struct Evaluator {
    interpreter: String,
    script: PathBuf,
    results_dir: PathBuf,
    etype: String,
}

impl Evaluator {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            results_dir: results_dir.into(),
            etype: "all".to_string(),
        }
    }

    /// Evaluator with paths resolved against the project root
    pub fn from_config(config: &Config) -> Self {
        let evaluator = &config.evaluator;
        Self {
            interpreter: evaluator.interpreter.clone(),
            script: config.resolve(&evaluator.script),
            results_dir: config.resolve(&evaluator.results_dir),
            etype: evaluator.etype.clone(),
        }
    }

    pub fn with_etype(mut self, etype: impl Into<String>) -> Self {
        self.etype = etype.into();
        self
    }

    /// Arguments passed to the interpreter
    pub fn arguments(&self, request: &EvaluationRequest) -> Vec<OsString> {
        vec![
            self.script.clone().into_os_string(),
            "--gold".into(),
            request.gold.clone().into_os_string(),
            "--pred".into(),
            request.pred.clone().into_os_string(),
            "--db".into(),
            request.db.clone().into_os_string(),
            "--table".into(),
            request.table.clone().into_os_string(),
            "--etype".into(),
            self.etype.clone().into(),
        ]
    }

    /// `<results_dir>/evaluation_<prediction file name>`
    pub fn results_path(&self, pred: &Path) -> PathBuf {
        let name = pred
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.results_dir.join(format!("evaluation_{}", name))
    }

    /// Run the harness and capture its output, whatever the exit status
    pub fn run(&self, request: &EvaluationRequest) -> Result<ProcessOutput, EvalError> {
        tracing::debug!(interpreter = %self.interpreter, script = %self.script.display(), "launching evaluator");

        let output = Command::new(&self.interpreter)
            .args(self.arguments(request))
            .output()
            .map_err(|e| EvalError::spawn(&self.interpreter, e))?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the harness and store its stdout; a non-zero exit is an error
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, EvalError> {
        let output = self.run(request)?;

        if !output.success() {
            tracing::warn!(code = ?output.exit_code, "evaluator failed");
            return Err(EvalError::EvaluatorFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let results_path = self.results_path(&request.pred);
        std::fs::create_dir_all(&self.results_dir).map_err(|e| EvalError::io(&self.results_dir, e))?;
        std::fs::write(&results_path, &output.stdout).map_err(|e| EvalError::io(&results_path, e))?;

        tracing::info!(results = %results_path.display(), "evaluation results saved");

        Ok(Evaluation { results_path, output })
    }
}
