//! Fine-tuning run planning and launch
//!
//! Profiles live in a JSON file mapping a name to the trainer's
//! configuration object. A run gets its own timestamped output directory,
//! created before the trainer starts, and the profile is handed over with
//! `output_dir` filled in.

use crate::error::EvalError;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the merged configuration file written into the run directory
pub const TRAIN_CONFIG_FILE: &str = "train_config.json";

/// Named trainer configurations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingProfiles {
    profiles: Map<String, Value>,
}

impl TrainingProfiles {
    pub fn from_file(path: &Path) -> Result<Self, EvalError> {
        let json = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_json(&json).map_err(|e| EvalError::MalformedJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            profiles: serde_json::from_str(json)?,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Configuration object of a profile
    pub fn get(&self, name: &str) -> Result<&Map<String, Value>, EvalError> {
        self.profiles
            .get(name)
            .ok_or_else(|| EvalError::UnknownProfile(name.to_string()))?
            .as_object()
            .ok_or_else(|| EvalError::InvalidProfile(name.to_string()))
    }
}

/// Experiment-tracking identity handed to the trainer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSession {
    pub project: String,
    pub run_name: String,
}

/// One planned fine-tuning run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRun {
    pub profile: String,

    /// `<profile>_<YYYY-MM-DD_HH-MM-SS>`
    pub run_name: String,

    pub output_dir: PathBuf,

    /// Profile configuration with `output_dir` set
    pub config: Map<String, Value>,
}

impl TrainingRun {
    /// Plan a run of `profile` started at `now`
    pub fn plan(
        profiles: &TrainingProfiles,
        profile: &str,
        checkpoints_dir: &Path,
        now: NaiveDateTime,
    ) -> Result<Self, EvalError> {
        let mut config = profiles.get(profile)?.clone();

        let run_name = format!("{}_{}", profile, now.format("%Y-%m-%d_%H-%M-%S"));
        let output_dir = checkpoints_dir.join(&run_name);

        config.insert(
            "output_dir".to_string(),
            Value::String(output_dir.display().to_string()),
        );

        Ok(Self {
            profile: profile.to_string(),
            run_name,
            output_dir,
            config,
        })
    }

    /// Create the output directory
    pub fn prepare(&self) -> Result<(), EvalError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| EvalError::io(&self.output_dir, e))
    }

    pub fn tracking_session(&self, project: impl Into<String>) -> TrackingSession {
        TrackingSession {
            project: project.into(),
            run_name: self.run_name.clone(),
        }
    }

    /// Create the output directory, then hand the run to `job`
    pub fn launch(&self, job: &dyn TrainingJob, tracking: &TrackingSession) -> Result<(), EvalError> {
        self.prepare()?;
        tracing::info!(run = %self.run_name, output_dir = %self.output_dir.display(), "starting training run");
        job.run(self, tracking)
    }
}

/// Executes a planned fine-tuning run
pub trait TrainingJob {
    fn run(&self, run: &TrainingRun, tracking: &TrackingSession) -> Result<(), EvalError>;
}

/// Runs an external trainer with the merged config path as last argument
///
/// The tracking session is exported to the trainer process only, as
/// `WANDB_PROJECT` and `WANDB_NAME`.
#[derive(Debug, Clone)]
pub struct CommandTrainingJob {
    argv: Vec<String>,
}

impl CommandTrainingJob {
    pub fn new(argv: Vec<String>) -> Result<Self, EvalError> {
        if argv.is_empty() {
            return Err(EvalError::EmptyCommand("training"));
        }
        Ok(Self { argv })
    }
}

impl TrainingJob for CommandTrainingJob {
    fn run(&self, run: &TrainingRun, tracking: &TrackingSession) -> Result<(), EvalError> {
        let config_path = run.output_dir.join(TRAIN_CONFIG_FILE);
        let json = serde_json::to_string_pretty(&run.config).map_err(|e| EvalError::MalformedJson {
            path: config_path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(&config_path, json).map_err(|e| EvalError::io(&config_path, e))?;

        let program = &self.argv[0];
        let status = Command::new(program)
            .args(&self.argv[1..])
            .arg(&config_path)
            .env("WANDB_PROJECT", &tracking.project)
            .env("WANDB_NAME", &tracking.run_name)
            .status()
            .map_err(|e| EvalError::spawn(program, e))?;

        if !status.success() {
            return Err(EvalError::TrainerFailed { code: status.code() });
        }

        Ok(())
    }
}
