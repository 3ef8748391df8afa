//! Corpus concatenation
//!
//! Entries are treated as opaque JSON values: no reordering, no dedup.

use crate::error::DatasetError;
use serde_json::Value;
use sqlprep_core::{to_indented_json, CombineSummary};
use std::path::{Path, PathBuf};

fn load_array(path: &Path) -> Result<Vec<Value>, DatasetError> {
    let json = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| DatasetError::malformed(path, e))
}

/// Concatenate `a` then `b` into `output`
pub fn combine(a: &Path, b: &Path, output: &Path) -> Result<CombineSummary, DatasetError> {
    combine_files(&[a.to_path_buf(), b.to_path_buf()], output)
}

/// Concatenate any number of JSON arrays, first to last, into `output`
///
/// All inputs are parsed before the output is touched.
pub fn combine_files(inputs: &[PathBuf], output: &Path) -> Result<CombineSummary, DatasetError> {
    let mut combined = Vec::new();
    for input in inputs {
        let entries = load_array(input)?;
        tracing::debug!(input = %input.display(), entries = entries.len(), "loaded corpus");
        combined.extend(entries);
    }

    let json = to_indented_json(&combined).map_err(|e| DatasetError::Serialize(e.to_string()))?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    std::fs::write(output, json).map_err(|e| DatasetError::io(output, e))?;

    tracing::info!(entries = combined.len(), output = %output.display(), "combined corpus written");

    Ok(CombineSummary {
        inputs: inputs.to_vec(),
        entries: combined.len(),
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn a_then_b_preserving_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        let out = dir.path().join("combined.json");
        std::fs::write(&a, r#"[{"db_id":"x"}]"#).unwrap();
        std::fs::write(&b, r#"[{"db_id":"y"}]"#).unwrap();

        let summary = combine(&a, &b, &out).unwrap();

        assert_eq!(summary.entries, 2);
        let merged: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(merged, json!([{"db_id": "x"}, {"db_id": "y"}]));
    }

    #[test]
    fn duplicates_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        std::fs::write(&a, r#"[{"db_id":"x"},{"db_id":"x"}]"#).unwrap();
        let out = dir.path().join("out.json");

        let summary = combine(&a, &a, &out).unwrap();
        assert_eq!(summary.entries, 4);
    }

    #[test]
    fn non_array_input_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        let out = dir.path().join("out.json");
        std::fs::write(&a, "[]").unwrap();
        std::fs::write(&b, r#"{"db_id":"y"}"#).unwrap();

        let err = combine(&a, &b, &out).unwrap_err();

        assert!(matches!(err, DatasetError::MalformedJson { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn key_order_survives_merge() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let out = dir.path().join("out.json");
        std::fs::write(&a, r#"[{"Question":"q","Schema":"s","Input":"qs","query":"","db_id":"d"}]"#).unwrap();

        combine_files(&[a], &out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let question = text.find("\"Question\"").unwrap();
        let db_id = text.find("\"db_id\"").unwrap();
        assert!(question < db_id);
    }
}
