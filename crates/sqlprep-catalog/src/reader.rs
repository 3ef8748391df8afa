//! Catalog reader trait for fetching table definitions

use std::path::Path;

/// Errors that can occur when extracting a schema
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to open database {path}: {message}")]
    OpenError { path: String, message: String },

    #[error("Catalog query failed for {path}: {message}")]
    QueryError { path: String, message: String },

    #[error("Failed to write schema file {path}: {message}")]
    WriteError { path: String, message: String },

    #[error("Database file has no parent directory: {0}")]
    NoParentDirectory(String),
}

/// Reads table-definition statements from an embedded database's catalog
///
/// Implementations must not modify the database they read.
pub trait CatalogReader {
    /// Reader name (e.g., "SQLite")
    fn name(&self) -> &'static str;

    /// Engine-native DDL text, one string per table, in catalog order
    fn table_definitions(&self, database: &Path) -> Result<Vec<String>, ExtractError>;
}

impl<T: CatalogReader + ?Sized> CatalogReader for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn table_definitions(&self, database: &Path) -> Result<Vec<String>, ExtractError> {
        (**self).table_definitions(database)
    }
}

impl<T: CatalogReader + ?Sized> CatalogReader for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn table_definitions(&self, database: &Path) -> Result<Vec<String>, ExtractError> {
        (**self).table_definitions(database)
    }
}
