//! End-to-end data preparation run
//!
//! Order: backfill → format each split → combine → relay gold files.

use crate::backfill::backfill;
use crate::collector::SchemaCollector;
use crate::combiner::combine_files;
use crate::error::DatasetError;
use crate::formatter::DatasetFormatter;
use crate::relay::relay;
use sqlprep_catalog::{CatalogReader, SchemaExtractor};
use sqlprep_core::{BackfillSummary, CombineSummary, Config, PipelineReport, RelaySummary, SplitSummary};
use std::path::{Path, PathBuf};

/// Runs the data preparation steps against one configuration
pub struct Pipeline<C> {
    config: Config,
    extractor: SchemaExtractor<C>,
}

impl<C: CatalogReader> Pipeline<C> {
    pub fn new(config: Config, catalog: C) -> Self {
        Self {
            config,
            extractor: SchemaExtractor::new(catalog),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn formatter(&self) -> DatasetFormatter {
        DatasetFormatter::new(SchemaCollector::new(self.config.database_root()))
    }

    /// Write `schema.sql` for every database directory lacking a `.sql` file
    pub fn backfill(&self) -> Result<BackfillSummary, DatasetError> {
        backfill(&self.config.database_root(), &self.extractor)
    }

    /// Format one split into `<output_dir>/<prefix>_<split>.json`
    pub fn format_split(&self, split: &str) -> Result<SplitSummary, DatasetError> {
        self.formatter().format_file(
            split,
            &self.config.raw_split_path(split),
            &self.config.corpus_path(split),
        )
    }

    /// Format every configured split, sharing one schema cache
    pub fn format_all(&self) -> Result<Vec<SplitSummary>, DatasetError> {
        let formatter = self.formatter();
        self.config
            .dataset
            .splits
            .iter()
            .map(|split| {
                formatter.format_file(
                    split,
                    &self.config.raw_split_path(split),
                    &self.config.corpus_path(split),
                )
            })
            .collect()
    }

    /// Merge the configured corpora; `None` when fewer than two are configured
    pub fn combine(&self) -> Result<Option<CombineSummary>, DatasetError> {
        let combine = &self.config.combine;
        if combine.inputs.len() < 2 {
            return Ok(None);
        }

        let inputs: Vec<PathBuf> = combine
            .inputs
            .iter()
            .map(|name| self.config.corpus_path(name))
            .collect();

        combine_files(&inputs, &self.config.corpus_path(&combine.output)).map(Some)
    }

    /// Copy every configured gold file to its plain-text destination
    pub fn relay_all(&self) -> Result<Vec<RelaySummary>, DatasetError> {
        self.config
            .relay
            .iter()
            .map(|r| {
                let (source, destination) = self.config.relay_paths(r);
                relay(&source, &destination)
            })
            .collect()
    }

    /// Run every step and collect the report
    pub fn run(&self) -> Result<PipelineReport, DatasetError> {
        let mut report = PipelineReport::new();

        report.backfill = Some(self.backfill()?);
        report.splits = self.format_all()?;
        report.combined = self.combine()?;
        report.relayed = self.relay_all()?;

        tracing::info!(
            splits = report.splits.len(),
            skipped = report.skipped_entries(),
            extraction_failures = report.extraction_failures(),
            "pipeline finished"
        );

        Ok(report)
    }

    /// Run every step and save the report to `report_path`
    pub fn prepare(&self, report_path: &Path) -> Result<PipelineReport, DatasetError> {
        let report = self.run()?;
        report
            .save_to_file(report_path)
            .map_err(|e| DatasetError::io(report_path, e))?;
        tracing::info!(report = %report_path.display(), "pipeline report saved");
        Ok(report)
    }
}
