//! Configuration schema (sqlprep.toml)
//!
//! Every relative path is resolved against `project_root`, which is the
//! directory holding the config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raw dataset layout and corpus output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Data directory containing `datasets/<suite>/`
    pub data_dir: PathBuf,

    /// Dataset suite name (e.g. "spider")
    pub suite: String,

    /// Splits to format, in order
    pub splits: Vec<String>,

    /// Directory receiving the formatted corpora
    pub output_dir: PathBuf,

    /// Corpus file prefix: `<prefix>_<split>.json`
    pub output_prefix: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            suite: "spider".to_string(),
            splits: vec![
                "dev".to_string(),
                "train_spider".to_string(),
                "train_others".to_string(),
            ],
            output_dir: PathBuf::from("data/datasets_json"),
            output_prefix: "spider".to_string(),
        }
    }
}

/// Which corpora are merged into one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Split names whose corpora are concatenated, first to last
    pub inputs: Vec<String>,

    /// Name of the merged corpus
    pub output: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            inputs: vec!["train_spider".to_string(), "train_others".to_string()],
            output: "train_combined".to_string(),
        }
    }
}

/// One gold file staged for the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Gold query dump, relative to the suite directory
    pub source: PathBuf,

    /// Plain-text copy, relative to the project root
    pub destination: PathBuf,
}

impl RelayConfig {
    fn gold(split: &str) -> Self {
        Self {
            source: PathBuf::from(format!("{}_gold.sql", split)),
            destination: PathBuf::from(format!("evaluation/gold/{}_gold.txt", split)),
        }
    }
}

fn default_relays() -> Vec<RelayConfig> {
    vec![RelayConfig::gold("dev"), RelayConfig::gold("train")]
}

/// External evaluation harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Interpreter used to launch the harness script
    pub interpreter: String,

    /// Harness entry point
    pub script: PathBuf,

    /// Where captured harness output is stored
    pub results_dir: PathBuf,

    /// Evaluation type flag passed through verbatim
    pub etype: String,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            script: PathBuf::from("repos/test-suite-sql-eval/evaluation.py"),
            results_dir: PathBuf::from("evaluation/results"),
            etype: "all".to_string(),
        }
    }
}

/// Fine-tuning job settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// JSON file mapping profile names to trainer configurations
    pub profiles: PathBuf,

    /// Parent directory of per-run checkpoint directories
    pub checkpoints_dir: PathBuf,

    /// Trainer argv; the merged config path is appended
    pub command: Vec<String>,

    /// Experiment-tracking project handed to the trainer
    pub tracking_project: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            profiles: PathBuf::from("scripts/configs.json"),
            checkpoints_dir: PathBuf::from("checkpoints"),
            command: Vec::new(),
            tracking_project: "BA_Text-To-SQL".to_string(),
        }
    }
}

/// Prediction generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Model argv; reads one input on stdin, answers on stdout
    pub command: Vec<String>,

    /// Base model reference passed to the model command
    pub model_name_or_path: String,

    /// Where predictions files are written
    pub predictions_dir: PathBuf,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            model_name_or_path: "codellama/CodeLlama-7b-hf".to_string(),
            predictions_dir: PathBuf::from("evaluation/predictions"),
        }
    }
}

/// Run report written by the full preparation pipeline
pub const PIPELINE_REPORT_FILE: &str = "pipeline-report.json";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub combine: CombineConfig,

    /// Gold files copied to plain text
    #[serde(default = "default_relays")]
    pub relay: Vec<RelayConfig>,

    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            combine: CombineConfig::default(),
            relay: default_relays(),
            evaluator: EvaluatorConfig::default(),
            training: TrainingConfig::default(),
            inference: InferenceConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Same configuration rooted somewhere else
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// `data/datasets/<suite>`
    pub fn suite_dir(&self) -> PathBuf {
        self.resolve(&self.dataset.data_dir)
            .join("datasets")
            .join(&self.dataset.suite)
    }

    /// `data/datasets/<suite>/database`
    pub fn database_root(&self) -> PathBuf {
        self.suite_dir().join("database")
    }

    /// `data/datasets/<suite>/<split>.json`
    pub fn raw_split_path(&self, split: &str) -> PathBuf {
        self.suite_dir().join(format!("{}.json", split))
    }

    /// Directory receiving formatted corpora
    pub fn corpus_dir(&self) -> PathBuf {
        self.resolve(&self.dataset.output_dir)
    }

    /// `<output_dir>/<prefix>_<name>.json`
    pub fn corpus_path(&self, name: &str) -> PathBuf {
        self.corpus_dir()
            .join(format!("{}_{}.json", self.dataset.output_prefix, name))
    }

    /// Source and destination of a relay entry
    pub fn relay_paths(&self, relay: &RelayConfig) -> (PathBuf, PathBuf) {
        (
            self.suite_dir().join(&relay.source),
            self.resolve(&relay.destination),
        )
    }

    /// Gold file handed to the evaluator: the first relay destination
    pub fn evaluation_gold_path(&self) -> Option<PathBuf> {
        self.relay.first().map(|relay| self.resolve(&relay.destination))
    }

    /// Where `prepare` stores its run report
    pub fn report_path(&self) -> PathBuf {
        self.resolve(Path::new(PIPELINE_REPORT_FILE))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.suite, "spider");
        assert_eq!(config.dataset.splits, vec!["dev", "train_spider", "train_others"]);
        assert_eq!(config.relay.len(), 2);
        assert_eq!(config.evaluator.etype, "all");
    }

    #[test]
    fn default_layout_paths() {
        let config = Config::default().with_project_root("/work");

        assert_eq!(
            config.database_root(),
            PathBuf::from("/work/data/datasets/spider/database")
        );
        assert_eq!(
            config.raw_split_path("dev"),
            PathBuf::from("/work/data/datasets/spider/dev.json")
        );
        assert_eq!(
            config.corpus_path("train_combined"),
            PathBuf::from("/work/data/datasets_json/spider_train_combined.json")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        let config = Config::default().with_project_root("/work");
        assert_eq!(config.resolve(Path::new("/abs/x")), PathBuf::from("/abs/x"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [dataset]
            suite = "cosql"
            splits = ["dev"]

            [[relay]]
            source = "a.sql"
            destination = "a.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset.suite, "cosql");
        assert_eq!(config.dataset.output_prefix, "spider");
        assert_eq!(config.relay.len(), 1);
        assert_eq!(config.combine.output, "train_combined");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::from_toml("dataset = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config.dataset, parsed.dataset);
        assert_eq!(config.relay, parsed.relay);
    }

    #[test]
    fn relay_sources_follow_dataset_suite() {
        let config = Config::from_toml(
            r#"
            [dataset]
            data_dir = "corpora"
            suite = "cosql"
            "#,
        )
        .unwrap()
        .with_project_root("/work");

        let (source, destination) = config.relay_paths(&config.relay[0]);
        assert_eq!(source, PathBuf::from("/work/corpora/datasets/cosql/dev_gold.sql"));
        assert_eq!(destination, PathBuf::from("/work/evaluation/gold/dev_gold.txt"));
        assert_eq!(
            config.evaluation_gold_path(),
            Some(PathBuf::from("/work/evaluation/gold/dev_gold.txt"))
        );
    }

    #[test]
    fn report_lands_in_project_root() {
        let config = Config::default().with_project_root("/work");
        assert_eq!(config.report_path(), PathBuf::from("/work/pipeline-report.json"));
    }
}
