//! SQLite catalog reader using sqlite_master
//!
//! Opens each database read-only, selects the stored `CREATE TABLE` text of
//! every table and closes the connection before returning.
//!
//! Reference: https://www.sqlite.org/schematab.html

use crate::reader::{CatalogReader, ExtractError};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

const TABLE_DEFINITIONS_QUERY: &str = "SELECT sql FROM sqlite_master WHERE type = 'table'";

/// SQLite catalog reader
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCatalog;

impl SqliteCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogReader for SqliteCatalog {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn table_definitions(&self, database: &Path) -> Result<Vec<String>, ExtractError> {
        let path = database.display().to_string();

        let conn = Connection::open_with_flags(
            database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ExtractError::OpenError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let query_error = |e: rusqlite::Error| ExtractError::QueryError {
            path: path.clone(),
            message: e.to_string(),
        };

        let mut stmt = conn.prepare(TABLE_DEFINITIONS_QUERY).map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))
            .map_err(query_error)?;

        let mut definitions = Vec::new();
        for row in rows {
            // Tables always carry their DDL; a NULL would be a corrupt catalog row
            if let Some(sql) = row.map_err(query_error)? {
                definitions.push(sql);
            }
        }

        tracing::debug!(database = %path, tables = definitions.len(), "read sqlite catalog");

        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_tables_in_catalog_order() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("concert.sqlite");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(
                "CREATE TABLE singer (id INTEGER PRIMARY KEY, name TEXT);
                 CREATE INDEX singer_name ON singer(name);
                 CREATE TABLE concert (id INTEGER, singer_id INTEGER);",
            )
            .unwrap();
        }

        let definitions = SqliteCatalog::new().table_definitions(&db_path).unwrap();
        assert_eq!(
            definitions,
            vec![
                "CREATE TABLE singer (id INTEGER PRIMARY KEY, name TEXT)".to_string(),
                "CREATE TABLE concert (id INTEGER, singer_id INTEGER)".to_string(),
            ]
        );
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteCatalog::new()
            .table_definitions(&dir.path().join("nope.sqlite"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::OpenError { .. }));
    }

    #[test]
    fn garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("broken.sqlite");
        std::fs::write(&db_path, b"this is definitely not a sqlite database file").unwrap();

        assert!(SqliteCatalog::new().table_definitions(&db_path).is_err());
    }
}
