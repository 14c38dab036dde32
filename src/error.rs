//! Error types for the premium prediction pipeline

use std::panic::Location;

use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PremiumError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PremiumError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Artifact mismatch: transformer from run {transformer_run}, model from run {model_run}")]
    ArtifactMismatch {
        transformer_run: String,
        model_run: String,
    },

    #[error("{stage} stage failed at {location}: {source}")]
    Stage {
        stage: PipelineStage,
        location: &'static Location<'static>,
        #[source]
        source: Box<PremiumError>,
    },
}

impl PremiumError {
    /// Wrap an error with the stage it surfaced in and the caller's location.
    #[track_caller]
    pub fn in_stage(self, stage: PipelineStage) -> Self {
        PremiumError::Stage {
            stage,
            location: Location::caller(),
            source: Box::new(self),
        }
    }

    /// The innermost cause, unwrapping stage context.
    pub fn root_cause(&self) -> &PremiumError {
        match self {
            PremiumError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<polars::error::PolarsError> for PremiumError {
    fn from(err: polars::error::PolarsError) -> Self {
        PremiumError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PremiumError {
    fn from(err: serde_json::Error) -> Self {
        PremiumError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PremiumError {
    fn from(err: ndarray::ShapeError) -> Self {
        PremiumError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
