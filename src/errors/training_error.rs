use thiserror::Error;

use super::ConfigError;

/// Errors raised at the training boundary.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset artifact is invalid: {0}")]
    InvalidDataset(#[from] serde_json::Error),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Model has not been trained")]
    NotTrained,

    #[error("Training validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Invalid hyperparameter {name}: {message}")]
    InvalidHyperparameter { name: String, message: String },

    #[error("Learned vocabulary is invalid: {0}")]
    Vocabulary(#[from] ConfigError),
}
