//! Catalog readers for embedded database files
//!
//! Reads the table definitions a database stores about itself and dumps
//! them as a `schema.sql` file next to the database.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlprep_catalog::{SchemaExtractor, SqliteCatalog};
//!
//! let extractor = SchemaExtractor::new(SqliteCatalog::new());
//! let written = extractor.extract(Path::new("database/concert_singer/concert_singer.sqlite"))?;
//! ```

pub mod extractor;
pub mod mock;
pub mod reader;
pub mod sqlite;

pub use extractor::{SchemaExtractor, SCHEMA_FILE_NAME};
pub use mock::MockCatalog;
pub use reader::{CatalogReader, ExtractError};
pub use sqlite::SqliteCatalog;
