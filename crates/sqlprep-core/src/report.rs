//! Pipeline report (stable v1)
//!
//! Records what one pipeline run discovered, wrote, and skipped.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A database file whose catalog could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    /// Path of the embedded database file
    pub database: PathBuf,

    /// Error message
    pub message: String,
}

/// Outcome of the schema backfill pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillSummary {
    /// Directories visited
    pub directories_scanned: usize,

    /// Directories already holding a `.sql` file
    pub directories_with_schema: usize,

    /// `schema.sql` files written
    pub extracted: Vec<PathBuf>,

    /// Per-database failures (never abort the pass)
    pub failures: Vec<ExtractionFailure>,
}

impl BackfillSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Outcome of formatting one split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Split name (e.g. "dev")
    pub split: String,

    /// Entries in the raw split file
    pub source_entries: usize,

    /// Examples written to the corpus
    pub written_entries: usize,

    /// Examples dropped for lack of a schema
    pub skipped_entries: usize,

    /// Corpus file
    pub output: PathBuf,
}

impl SplitSummary {
    /// True when every source entry made it into the corpus
    pub fn is_complete(&self) -> bool {
        self.source_entries == self.written_entries
    }
}

/// Outcome of merging corpora
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineSummary {
    pub inputs: Vec<PathBuf>,
    pub entries: usize,
    pub output: PathBuf,
}

/// A gold file staged as plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// Pipeline run report (pipeline-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    #[serde(default)]
    pub backfill: Option<BackfillSummary>,

    #[serde(default)]
    pub splits: Vec<SplitSummary>,

    #[serde(default)]
    pub combined: Option<CombineSummary>,

    #[serde(default)]
    pub relayed: Vec<RelaySummary>,
}

impl PipelineReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            backfill: None,
            splits: Vec::new(),
            combined: None,
            relayed: Vec::new(),
        }
    }

    /// Total examples dropped across all splits
    pub fn skipped_entries(&self) -> usize {
        self.splits.iter().map(|s| s.skipped_entries).sum()
    }

    /// Number of databases whose extraction failed
    pub fn extraction_failures(&self) -> usize {
        self.backfill.as_ref().map_or(0, |b| b.failures.len())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for PipelineReport {
    fn default() -> Self {
        Self::new()
    }
}
