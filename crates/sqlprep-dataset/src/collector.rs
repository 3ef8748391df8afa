//! `CREATE TABLE` collection from per-database `.sql` files
//!
//! Extraction is lexical, not a SQL parse. The pattern stops at the first
//! `);` after the opening parenthesis, so a definition containing `);`
//! inside a string literal (a default value, a check constraint) is cut
//! short there. Downstream corpora rely on this exact output.

use crate::discovery::files_with_extension;
use crate::error::DatasetError;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlprep_core::{DatabaseId, SchemaText};
use std::path::{Path, PathBuf};

static CREATE_TABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)CREATE TABLE\s+.*?\(.*?\);").unwrap());

/// Every `CREATE TABLE ... );` block in `sql`, in order of appearance
pub fn extract_create_tables(sql: &str) -> impl Iterator<Item = &str> {
    CREATE_TABLE_REGEX.find_iter(sql).map(|m| m.as_str())
}

/// Looks up the schema of a database under a database root directory
#[derive(Debug, Clone)]
pub struct SchemaCollector {
    database_root: PathBuf,
}

impl SchemaCollector {
    pub fn new(database_root: impl Into<PathBuf>) -> Self {
        Self {
            database_root: database_root.into(),
        }
    }

    pub fn database_root(&self) -> &Path {
        &self.database_root
    }

    /// Directory holding the files of one database
    pub fn database_dir(&self, db_id: &DatabaseId) -> PathBuf {
        self.database_root.join(db_id.as_str())
    }

    /// `.sql` files of a database, in file-name order
    pub fn sql_files(&self, db_id: &DatabaseId) -> Result<Vec<PathBuf>, DatasetError> {
        let dir = self.database_dir(db_id);
        files_with_extension(&dir, "sql").map_err(|e| DatasetError::io(&dir, e))
    }

    /// Collect the schema of a database
    ///
    /// Returns `None` when the database has no `.sql` file at all. A database
    /// whose files contain no `CREATE TABLE` yields an empty (header-only)
    /// schema instead.
    pub fn collect(&self, db_id: &DatabaseId) -> Result<Option<SchemaText>, DatasetError> {
        let files = self.sql_files(db_id)?;
        if files.is_empty() {
            tracing::debug!(db_id = %db_id, "no .sql file found");
            return Ok(None);
        }

        let mut schema = SchemaText::new();
        for file in &files {
            let bytes = std::fs::read(file).map_err(|e| DatasetError::io(file, e))?;
            let content = String::from_utf8_lossy(&bytes);

            for statement in extract_create_tables(&content) {
                schema.push(statement);
            }
        }

        tracing::debug!(
            db_id = %db_id,
            files = files.len(),
            statements = schema.len(),
            "collected schema"
        );

        Ok(Some(schema))
    }
}
