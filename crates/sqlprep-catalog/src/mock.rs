//! Mock catalog reader for testing
//!
//! Returns predefined table definitions without opening any database file.
//! It's useful for:
//! - Unit testing the backfill driver without real database files
//! - Simulating unreadable or corrupt databases
//! - Counting how often a database was read
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlprep_catalog::{MockCatalog, CatalogReader};
//!
//! let catalog = MockCatalog::new()
//!     .with_tables("db/a/a.sqlite", ["CREATE TABLE t (x INT)"])
//!     .with_failure("db/b/b.sqlite", "file is not a database");
//!
//! assert_eq!(catalog.table_definitions(Path::new("db/a/a.sqlite"))?.len(), 1);
//! ```

use crate::reader::{CatalogReader, ExtractError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mock catalog reader for testing
///
/// Unknown paths behave like a database that cannot be opened.
#[derive(Debug, Default)]
pub struct MockCatalog {
    /// Predefined definitions by database path
    tables: HashMap<PathBuf, Vec<String>>,

    /// Failure messages by database path
    failures: HashMap<PathBuf, String>,

    /// Every path read, in order
    reads: RefCell<Vec<PathBuf>>,
}

impl MockCatalog {
    /// Create a new mock catalog with no databases
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table definitions returned for a database path
    pub fn with_tables<I, S>(mut self, database: impl Into<PathBuf>, definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(
            database.into(),
            definitions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Make catalog queries against a database path fail
    pub fn with_failure(mut self, database: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.failures.insert(database.into(), message.into());
        self
    }

    /// Paths read so far
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.borrow().clone()
    }
}

impl CatalogReader for MockCatalog {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn table_definitions(&self, database: &Path) -> Result<Vec<String>, ExtractError> {
        self.reads.borrow_mut().push(database.to_path_buf());

        if let Some(message) = self.failures.get(database) {
            return Err(ExtractError::QueryError {
                path: database.display().to_string(),
                message: message.clone(),
            });
        }

        self.tables
            .get(database)
            .cloned()
            .ok_or_else(|| ExtractError::OpenError {
                path: database.display().to_string(),
                message: "unknown database".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_registered_tables() {
        let catalog = MockCatalog::new().with_tables("a.sqlite", ["CREATE TABLE t (x INT)"]);

        let tables = catalog.table_definitions(Path::new("a.sqlite")).unwrap();
        assert_eq!(tables, vec!["CREATE TABLE t (x INT)".to_string()]);
        assert_eq!(catalog.reads(), vec![PathBuf::from("a.sqlite")]);
    }

    #[test]
    fn simulated_failure() {
        let catalog = MockCatalog::new().with_failure("b.sqlite", "file is not a database");

        let err = catalog.table_definitions(Path::new("b.sqlite")).unwrap_err();
        assert!(err.to_string().contains("file is not a database"));
    }

    #[test]
    fn unknown_database_fails_to_open() {
        let catalog = MockCatalog::new();
        let err = catalog.table_definitions(Path::new("c.sqlite")).unwrap_err();
        assert!(matches!(err, ExtractError::OpenError { .. }));
    }
}
