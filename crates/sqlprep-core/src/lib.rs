//! sqlprep Core
//!
//! Domain model shared by every stage of the text-to-SQL data pipeline:
//! database identifiers, collected schema text, raw and formatted examples,
//! configuration, and the versioned pipeline report.

pub mod config;
pub mod example;
pub mod report;

pub use config::{
    CombineConfig, Config, ConfigError, DatasetConfig, EvaluatorConfig, InferenceConfig,
    RelayConfig, TrainingConfig, PIPELINE_REPORT_FILE,
};
pub use example::{
    to_indented_json, Corpus, DatabaseId, FormattedExample, RawExample, SchemaText,
    QUESTION_PREFIX, SCHEMA_HEADER,
};
pub use report::{
    BackfillSummary, CombineSummary, ExtractionFailure, PipelineReport, RelaySummary,
    ReportVersion, SplitSummary,
};
