//! Integration tests for schema extraction against real SQLite files

use rusqlite::Connection;
use sqlprep_catalog::{SchemaExtractor, SqliteCatalog};
use std::path::Path;

fn create_database(path: &Path, ddl: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(ddl).unwrap();
}

#[test]
fn extracts_one_statement_per_table_in_catalog_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("world_1.sqlite");
    create_database(
        &db,
        "CREATE TABLE city (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE country (code TEXT PRIMARY KEY, name TEXT);
         CREATE TABLE countrylanguage (code TEXT, language TEXT);",
    );

    let written = SchemaExtractor::new(SqliteCatalog::new()).extract(&db).unwrap();
    let dump = std::fs::read_to_string(written).unwrap();

    assert_eq!(
        dump,
        "CREATE TABLE city (id INTEGER PRIMARY KEY, name TEXT);\n\n\
         CREATE TABLE country (code TEXT PRIMARY KEY, name TEXT);\n\n\
         CREATE TABLE countrylanguage (code TEXT, language TEXT);\n\n"
    );
}

#[test]
fn extraction_does_not_modify_source_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pets_1.sqlite");
    create_database(&db, "CREATE TABLE pets (id INTEGER);");
    let before = std::fs::read(&db).unwrap();

    SchemaExtractor::new(SqliteCatalog::new()).extract(&db).unwrap();

    assert_eq!(std::fs::read(&db).unwrap(), before);
}

#[test]
fn corrupt_database_reports_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("broken.sqlite");
    std::fs::write(&db, "not a database, just some text that is long enough").unwrap();

    let result = SchemaExtractor::new(SqliteCatalog::new()).extract(&db);

    assert!(result.is_err());
    assert!(!dir.path().join("schema.sql").exists());
}
