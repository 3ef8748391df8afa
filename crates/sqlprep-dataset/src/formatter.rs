//! Raw split → corpus formatting

use crate::collector::SchemaCollector;
use crate::error::DatasetError;
use sqlprep_core::{Corpus, DatabaseId, FormattedExample, RawExample, SchemaText, SplitSummary};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Load a raw split file (a JSON array of question/query records)
pub fn load_raw_examples(path: &Path) -> Result<Vec<RawExample>, DatasetError> {
    let json = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| DatasetError::malformed(path, e))
}

/// Result of formatting one sequence of raw examples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOutcome {
    pub corpus: Corpus,

    /// Number of raw examples considered
    pub source_entries: usize,

    /// Databases whose examples were dropped for lack of a schema
    pub missing_schemas: BTreeSet<DatabaseId>,
}

impl FormatOutcome {
    pub fn skipped_entries(&self) -> usize {
        self.source_entries - self.corpus.len()
    }
}

/// Joins raw examples with the schema of their database
///
/// Schemas are looked up once per database and reused for the lifetime of
/// the formatter; `.sql` files must not change while it is in use.
pub struct DatasetFormatter {
    collector: SchemaCollector,
    cache: RefCell<HashMap<DatabaseId, Option<SchemaText>>>,
}

impl DatasetFormatter {
    pub fn new(collector: SchemaCollector) -> Self {
        Self {
            collector,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn collector(&self) -> &SchemaCollector {
        &self.collector
    }

    fn schema_for(&self, db_id: &DatabaseId) -> Result<Option<SchemaText>, DatasetError> {
        if let Some(cached) = self.cache.borrow().get(db_id) {
            return Ok(cached.clone());
        }

        let schema = self.collector.collect(db_id)?;
        self.cache.borrow_mut().insert(db_id.clone(), schema.clone());
        Ok(schema)
    }

    /// Format examples in order, dropping those whose database has no schema
    pub fn format_examples(&self, raw: &[RawExample]) -> Result<FormatOutcome, DatasetError> {
        let mut outcome = FormatOutcome {
            source_entries: raw.len(),
            ..Default::default()
        };

        for example in raw {
            match self.schema_for(&example.db_id)? {
                Some(schema) => outcome.corpus.push(FormattedExample::new(example, &schema)),
                None => {
                    outcome.missing_schemas.insert(example.db_id.clone());
                }
            }
        }

        Ok(outcome)
    }

    /// Format a raw split file and write the corpus to `output`
    ///
    /// Nothing is written unless the input parses and every example has been
    /// processed.
    pub fn format_file(&self, split: &str, input: &Path, output: &Path) -> Result<SplitSummary, DatasetError> {
        let raw = load_raw_examples(input)?;
        tracing::info!(split, entries = raw.len(), input = %input.display(), "loaded raw split");

        let outcome = self.format_examples(&raw)?;
        let json = outcome
            .corpus
            .to_json()
            .map_err(|e| DatasetError::Serialize(e.to_string()))?;

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }
        std::fs::write(output, json).map_err(|e| DatasetError::io(output, e))?;

        let summary = SplitSummary {
            split: split.to_string(),
            source_entries: outcome.source_entries,
            written_entries: outcome.corpus.len(),
            skipped_entries: outcome.skipped_entries(),
            output: output.to_path_buf(),
        };

        if summary.is_complete() {
            tracing::info!(split, entries = summary.written_entries, output = %output.display(), "corpus written");
        } else {
            tracing::warn!(
                split,
                written = summary.written_entries,
                source = summary.source_entries,
                missing = ?outcome.missing_schemas,
                "corpus written with examples dropped for missing schemas"
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(question: &str, db_id: &str) -> RawExample {
        RawExample {
            question: question.to_string(),
            db_id: DatabaseId::new(db_id),
            query: format!("SELECT '{}'", question),
        }
    }

    fn fixture() -> (tempfile::TempDir, DatasetFormatter) {
        let root = tempfile::tempdir().unwrap();
        let db_dir = root.path().join("concert");
        std::fs::create_dir_all(&db_dir).unwrap();
        std::fs::write(db_dir.join("schema.sql"), "CREATE TABLE singer (id INT);").unwrap();
        std::fs::create_dir_all(root.path().join("no_schema")).unwrap();

        let formatter = DatasetFormatter::new(SchemaCollector::new(root.path()));
        (root, formatter)
    }

    #[test]
    fn examples_without_schema_are_dropped() {
        let (_root, formatter) = fixture();
        let examples = vec![raw("a", "concert"), raw("b", "no_schema"), raw("c", "concert")];

        let outcome = formatter.format_examples(&examples).unwrap();

        assert_eq!(outcome.source_entries, 3);
        assert_eq!(outcome.corpus.len(), 2);
        assert_eq!(outcome.skipped_entries(), 1);
        assert!(outcome.missing_schemas.contains(&DatabaseId::new("no_schema")));

        let questions: Vec<&str> = outcome.corpus.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["Question: a", "Question: c"]);
    }

    #[test]
    fn every_input_is_question_plus_schema() {
        let (_root, formatter) = fixture();
        let outcome = formatter
            .format_examples(&[raw("x", "concert"), raw("y", "concert")])
            .unwrap();

        for example in &outcome.corpus {
            assert_eq!(example.input, format!("{}{}", example.question, example.schema));
            assert_eq!(example.schema, "\nSchema:\nCREATE TABLE singer (id INT);");
        }
    }

    #[test]
    fn null_query_keeps_the_example() {
        let (root, formatter) = fixture();
        let input = root.path().join("dev.json");
        let output = root.path().join("out/spider_dev.json");
        std::fs::write(&input, r#"[{"question":"q","db_id":"concert","query":null}]"#).unwrap();

        let summary = formatter.format_file("dev", &input, &output).unwrap();

        assert_eq!(summary.written_entries, 1);
        let corpus = Corpus::from_json(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(corpus.examples()[0].query, "");
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let (root, formatter) = fixture();
        let input = root.path().join("dev.json");
        let output = root.path().join("out/spider_dev.json");
        std::fs::write(&input, "[{\"question\": \"q\", ").unwrap();

        let err = formatter.format_file("dev", &input, &output).unwrap_err();

        assert!(matches!(err, DatasetError::MalformedJson { .. }));
        assert!(!output.exists());
    }
}
