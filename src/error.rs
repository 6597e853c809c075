//! Error types for the churn analysis pipeline

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Errors produced by the analysis pipeline.
///
/// Load/parse and training errors are fatal to the run; data-quality issues
/// (missing values, unseen categories, unparsable numeric strings) are
/// recovered locally and never surface here.
#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model has not been fitted yet")]
    ModelNotFitted,

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
