//! Plain-text staging of gold query files

use crate::error::DatasetError;
use sqlprep_core::RelaySummary;
use std::path::Path;

/// Copy the content of `source` to `destination`, replacing it
///
/// Only content is copied; the destination keeps default permissions.
/// Missing parent directories of `destination` are created.
pub fn relay(source: &Path, destination: &Path) -> Result<RelaySummary, DatasetError> {
    let content = std::fs::read(source).map_err(|e| DatasetError::io(source, e))?;

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    std::fs::write(destination, &content).map_err(|e| DatasetError::io(destination, e))?;

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        "content copied"
    );

    Ok(RelaySummary {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        bytes: content.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_bytes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dev_gold.sql");
        let destination = dir.path().join("gold/dev_gold.txt");
        let content = "SELECT count(*) FROM singer\tconcert_singer\nSELECT name FROM stadium\tconcert_singer\nSELECT 1\tpets_1\n";
        std::fs::write(&source, content).unwrap();

        let summary = relay(&source, &destination).unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), content.as_bytes());
        assert_eq!(summary.bytes, content.len() as u64);
    }

    #[test]
    fn overwrites_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.sql");
        let destination = dir.path().join("a.txt");
        std::fs::write(&source, "new").unwrap();
        std::fs::write(&destination, "old content that is longer").unwrap();

        relay(&source, &destination).unwrap();

        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn unreadable_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = relay(&dir.path().join("missing.sql"), &dir.path().join("x.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert!(!dir.path().join("x.txt").exists());
    }
}
