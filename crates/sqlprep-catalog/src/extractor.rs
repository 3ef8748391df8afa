//! Schema dump writer
//!
//! Turns the catalog of one database file into a `schema.sql` sibling file.
//! Whether a dump is needed at all is decided by the caller.

use crate::reader::{CatalogReader, ExtractError};
use std::path::{Path, PathBuf};

/// File name of every generated schema dump
pub const SCHEMA_FILE_NAME: &str = "schema.sql";

/// Writes catalog table definitions to `schema.sql`
pub struct SchemaExtractor<C> {
    catalog: C,
}

impl<C: CatalogReader> SchemaExtractor<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Dump the schema of `database` into `schema.sql` in the same directory
    ///
    /// Returns the path written. An existing `schema.sql` is replaced.
    pub fn extract(&self, database: &Path) -> Result<PathBuf, ExtractError> {
        let dir = database
            .parent()
            .ok_or_else(|| ExtractError::NoParentDirectory(database.display().to_string()))?;
        let output = dir.join(SCHEMA_FILE_NAME);

        self.extract_to(database, &output)?;
        Ok(output)
    }

    /// Dump the schema of `database` into an explicit output file
    ///
    /// The catalog is read completely before the output file is created, so a
    /// failed read leaves no file behind.
    pub fn extract_to(&self, database: &Path, output: &Path) -> Result<(), ExtractError> {
        let definitions = self.catalog.table_definitions(database)?;
        let dump = render_dump(&definitions);

        std::fs::write(output, dump).map_err(|e| ExtractError::WriteError {
            path: output.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::info!(
            reader = self.catalog.name(),
            database = %database.display(),
            output = %output.display(),
            tables = definitions.len(),
            "schema extracted"
        );

        Ok(())
    }
}

/// Each definition terminated by `;` and followed by a blank line
fn render_dump(definitions: &[String]) -> String {
    let mut dump = String::new();
    for definition in definitions {
        dump.push_str(definition);
        dump.push_str(";\n\n");
    }
    dump
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCatalog;
    use pretty_assertions::assert_eq;

    #[test]
    fn dump_format() {
        let dump = render_dump(&["CREATE TABLE a (x)".to_string(), "CREATE TABLE b (y)".to_string()]);
        assert_eq!(dump, "CREATE TABLE a (x);\n\nCREATE TABLE b (y);\n\n");
    }

    #[test]
    fn empty_catalog_writes_empty_file() {
        assert_eq!(render_dump(&[]), "");
    }

    #[test]
    fn writes_sibling_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("pets.sqlite");
        let extractor = SchemaExtractor::new(
            MockCatalog::new().with_tables(db.clone(), ["CREATE TABLE pets (id INT)"]),
        );

        let written = extractor.extract(&db).unwrap();

        assert_eq!(written, dir.path().join("schema.sql"));
        assert_eq!(
            std::fs::read_to_string(&written).unwrap(),
            "CREATE TABLE pets (id INT);\n\n"
        );
    }

    #[test]
    fn failed_read_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("broken.sqlite");
        let extractor = SchemaExtractor::new(MockCatalog::new().with_failure(db.clone(), "corrupt"));

        assert!(extractor.extract(&db).is_err());
        assert!(!dir.path().join("schema.sql").exists());
    }
}
