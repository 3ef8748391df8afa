//! Prediction generation for a formatted corpus

use crate::error::EvalError;
use sqlprep_core::Corpus;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Produces one response per prompt
pub trait CompletionModel {
    fn complete(&mut self, input: &str) -> Result<String, EvalError>;
}

impl<F> CompletionModel for F
where
    F: FnMut(&str) -> Result<String, EvalError>,
{
    fn complete(&mut self, input: &str) -> Result<String, EvalError> {
        self(input)
    }
}

/// Model served by an external command
///
/// The command is started once per input, receives the input on stdin and
/// answers on stdout. `--model_name_or_path` and `--adapter_name_or_path`
/// are appended to the configured argv.
#[derive(Debug, Clone)]
pub struct CommandModel {
    argv: Vec<String>,
    model_name_or_path: String,
    adapter: PathBuf,
}

impl CommandModel {
    pub fn new(
        argv: Vec<String>,
        model_name_or_path: impl Into<String>,
        adapter: impl Into<PathBuf>,
    ) -> Result<Self, EvalError> {
        if argv.is_empty() {
            return Err(EvalError::EmptyCommand("inference"));
        }
        Ok(Self {
            argv,
            model_name_or_path: model_name_or_path.into(),
            adapter: adapter.into(),
        })
    }
}

impl CompletionModel for CommandModel {
    fn complete(&mut self, input: &str) -> Result<String, EvalError> {
        let program = &self.argv[0];
        let mut child = Command::new(program)
            .args(&self.argv[1..])
            .arg("--model_name_or_path")
            .arg(&self.model_name_or_path)
            .arg("--adapter_name_or_path")
            .arg(&self.adapter)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EvalError::spawn(program, e))?;

        // Feed stdin while the output pipes drain
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(input.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(|e| EvalError::spawn(program, e))?;
        if !output.status.success() {
            return Err(EvalError::ModelFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // A model may answer without consuming its whole input
        match written {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
                return Err(EvalError::spawn(program, err));
            }
            _ => {}
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

/// `limit` as text, or `all` when every entry is processed
pub fn count_label(limit: Option<usize>, total: usize) -> String {
    match limit {
        Some(n) if n < total => n.to_string(),
        _ => "all".to_string(),
    }
}

/// `predicted_<count>_<checkpoint>.txt`
pub fn predictions_file_name(count: &str, checkpoint: &str) -> String {
    format!("predicted_{}_{}.txt", count, checkpoint)
}

/// Complete the `Input` of the first `limit` examples, in corpus order
pub fn generate_predictions<M: CompletionModel + ?Sized>(
    model: &mut M,
    corpus: &Corpus,
    limit: Option<usize>,
) -> Result<Vec<String>, EvalError> {
    let take = limit.unwrap_or(corpus.len()).min(corpus.len());
    let mut outputs = Vec::with_capacity(take);

    for (i, example) in corpus.iter().take(take).enumerate() {
        outputs.push(model.complete(&example.input)?);
        tracing::debug!(done = i + 1, total = take, "prediction generated");
    }

    tracing::info!(predictions = outputs.len(), "predictions generated");
    Ok(outputs)
}

/// Write one prediction per line
///
/// Line breaks inside a prediction are folded to spaces so line N always
/// belongs to example N.
pub fn write_predictions(path: &Path, predictions: &[String]) -> Result<(), EvalError> {
    let mut content = String::new();
    for prediction in predictions {
        let line: String = prediction
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join(" ");
        content.push_str(&line);
        content.push('\n');
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| EvalError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlprep_core::{DatabaseId, FormattedExample, RawExample, SchemaText};

    fn corpus(questions: &[&str]) -> Corpus {
        let mut corpus = Corpus::new();
        for q in questions {
            let raw = RawExample {
                question: q.to_string(),
                db_id: DatabaseId::new("d"),
                query: String::new(),
            };
            corpus.push(FormattedExample::new(&raw, &SchemaText::new()));
        }
        corpus
    }

    #[test]
    fn count_labels() {
        assert_eq!(count_label(Some(5), 100), "5");
        assert_eq!(count_label(Some(100), 100), "all");
        assert_eq!(count_label(None, 100), "all");
        assert_eq!(predictions_file_name("all", "default"), "predicted_all_default.txt");
    }

    #[test]
    fn limit_takes_first_entries() {
        let corpus = corpus(&["a", "b", "c"]);
        let mut seen = Vec::new();
        let mut model = |input: &str| -> Result<String, EvalError> {
            seen.push(input.to_string());
            Ok(format!("SELECT {}", seen.len()))
        };

        let outputs = generate_predictions(&mut model, &corpus, Some(2)).unwrap();

        assert_eq!(outputs, vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(seen, vec!["Question: a\nSchema:", "Question: b\nSchema:"]);
    }

    #[test]
    fn model_error_stops_generation() {
        let corpus = corpus(&["a"]);
        let mut model = |_: &str| -> Result<String, EvalError> { Err(EvalError::EmptyCommand("inference")) };
        assert!(generate_predictions(&mut model, &corpus, None).is_err());
    }

    #[test]
    fn one_prediction_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions/predicted_2_default.txt");

        write_predictions(
            &path,
            &["SELECT 1".to_string(), "SELECT name\nFROM singer".to_string()],
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "SELECT 1\nSELECT name FROM singer\n"
        );
    }
}
