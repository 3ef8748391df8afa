//! Dataset normalization pipeline
//!
//! Converts per-database schema dumps plus question/query pairs into the
//! uniform JSON corpus format:
//! - [`backfill`] writes missing `schema.sql` dumps from embedded databases
//! - [`collector`] gathers `CREATE TABLE` statements for one database
//! - [`formatter`] joins raw examples with their schema
//! - [`combiner`] concatenates corpora
//! - [`relay`] stages gold query files as plain text
//! - [`pipeline`] runs all of the above in order

pub mod backfill;
pub mod collector;
pub mod combiner;
pub mod discovery;
pub mod error;
pub mod formatter;
pub mod pipeline;
pub mod relay;

pub use backfill::{backfill, plan_backfill, run_backfill, BackfillPlan, BackfillTarget};
pub use collector::{extract_create_tables, SchemaCollector};
pub use combiner::{combine, combine_files};
pub use error::DatasetError;
pub use formatter::{load_raw_examples, DatasetFormatter, FormatOutcome};
pub use pipeline::Pipeline;
pub use relay::relay;
