//! Interfaces to the external model tooling
//!
//! Training, inference and scoring are performed by external programs; this
//! crate only prepares their inputs, launches them, and captures outputs.

pub mod error;
pub mod evaluator;
pub mod predict;
pub mod scores;
pub mod training;

pub use error::EvalError;
pub use evaluator::{Evaluation, EvaluationRequest, Evaluator, ProcessOutput};
pub use predict::{
    count_label, generate_predictions, predictions_file_name, write_predictions, CommandModel,
    CompletionModel,
};
pub use scores::{is_score_header, lines_from_header};
pub use training::{CommandTrainingJob, TrackingSession, TrainingJob, TrainingProfiles, TrainingRun};
