//! Schema backfill for databases shipped without a `.sql` dump
//!
//! Split in two phases: [`plan_backfill`] only enumerates the tree, and
//! [`run_backfill`] performs the extractions. A directory that already holds
//! any `.sql` file is never touched, however old that file is. Directories
//! that cannot be listed are reported as failures and the walk goes on.

use crate::discovery::files_with_extension;
use crate::error::DatasetError;
use sqlprep_catalog::{CatalogReader, SchemaExtractor};
use sqlprep_core::{BackfillSummary, ExtractionFailure};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A directory lacking a `.sql` file, with the databases to extract from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTarget {
    pub directory: PathBuf,

    /// `.sqlite` files in file-name order; the last one's schema wins
    pub databases: Vec<PathBuf>,
}

/// Result of walking a database root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillPlan {
    pub directories_scanned: usize,
    pub directories_with_schema: usize,
    pub targets: Vec<BackfillTarget>,

    /// Directories whose content could not be listed
    pub unreadable: Vec<ExtractionFailure>,
}

impl BackfillPlan {
    fn mark_unreadable(&mut self, path: &Path, message: String) {
        if self.unreadable.iter().any(|f| f.database == path) {
            return;
        }
        tracing::warn!(directory = %path.display(), error = %message, "skipping unreadable directory");
        self.unreadable.push(ExtractionFailure {
            database: path.to_path_buf(),
            message,
        });
    }
}

/// `.sql` and `.sqlite` files of one directory
fn list_schema_sources(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    Ok((
        files_with_extension(dir, "sql")?,
        files_with_extension(dir, "sqlite")?,
    ))
}

/// Walk `root` once and list every directory needing a schema dump
pub fn plan_backfill(root: &Path) -> Result<BackfillPlan, DatasetError> {
    if !root.is_dir() {
        return Err(DatasetError::MissingDirectory(root.display().to_string()));
    }

    let mut plan = BackfillPlan::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                match err.path() {
                    Some(path) => plan.mark_unreadable(path, err.to_string()),
                    None => tracing::warn!(error = %err, "skipping unreadable entry"),
                }
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        plan.directories_scanned += 1;

        let (sql_files, databases) = match list_schema_sources(dir) {
            Ok(found) => found,
            Err(err) => {
                plan.mark_unreadable(dir, err.to_string());
                continue;
            }
        };

        if !sql_files.is_empty() {
            plan.directories_with_schema += 1;
            continue;
        }

        if !databases.is_empty() {
            plan.targets.push(BackfillTarget {
                directory: dir.to_path_buf(),
                databases,
            });
        }
    }

    tracing::debug!(
        scanned = plan.directories_scanned,
        targets = plan.targets.len(),
        "backfill planned"
    );

    Ok(plan)
}

/// Extract every planned database, isolating failures per database
pub fn run_backfill<C: CatalogReader>(plan: &BackfillPlan, extractor: &SchemaExtractor<C>) -> BackfillSummary {
    let mut summary = BackfillSummary {
        directories_scanned: plan.directories_scanned,
        directories_with_schema: plan.directories_with_schema,
        failures: plan.unreadable.clone(),
        ..Default::default()
    };

    for target in &plan.targets {
        for database in &target.databases {
            match extractor.extract(database) {
                Ok(written) => {
                    if !summary.extracted.contains(&written) {
                        summary.extracted.push(written);
                    }
                }
                Err(err) => {
                    tracing::warn!(database = %database.display(), error = %err, "schema extraction failed");
                    summary.failures.push(ExtractionFailure {
                        database: database.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        extracted = summary.extracted.len(),
        failures = summary.failures.len(),
        "schema backfill finished"
    );

    summary
}

/// Plan and run the backfill over `root`
pub fn backfill<C: CatalogReader>(root: &Path, extractor: &SchemaExtractor<C>) -> Result<BackfillSummary, DatasetError> {
    let plan = plan_backfill(root)?;
    Ok(run_backfill(&plan, extractor))
}
