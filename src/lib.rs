//! Premium AutoML - health-insurance premium prediction
//!
//! This crate trains a regression model that quotes an individual
//! health-insurance premium from six applicant fields, and serves
//! predictions from the persisted artifacts:
//! - Ingestion, cleaning and a reproducible train/test split
//! - A fitted feature transformer (impute, scale, one-hot encode)
//! - Holdout model selection over five regressor families
//! - Grid-search tuning with parallel k-fold cross-validation
//! - Experiment tracking of parameters, metrics and model artifacts
//! - Paired transformer/model artifacts for inference
//!
//! # Modules
//!
//! ## Pipeline
//! - [`data`] - Raw dataset ingestion, customer records, splitting
//! - [`preprocessing`] - Feature transformer and its building blocks
//! - [`training`] - Regressors, cross-validation, model selection
//! - [`optimizer`] - Hyperparameter grids and grid search
//! - [`tracking`] - Experiment log and final model evaluation
//! - [`pipeline`] - Training orchestrator and artifact store
//!
//! ## Serving
//! - [`inference`] - Single-record prediction and the record store
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`utils`] - CSV IO and per-run log files

// Core error handling
pub mod error;

// Pipeline stages
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod tracking;
pub mod pipeline;

// Serving
pub mod inference;
pub mod cli;

pub mod utils;

pub use error::{PremiumError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PremiumError, Result};

    // Data
    pub use crate::data::{CustomerRecord, DataIngestion, Region, Sex, Smoker, TrainTestSplit};

    // Preprocessing
    pub use crate::preprocessing::{FeatureTransformer, TransformerBuilder, TransformerConfig};

    // Training
    pub use crate::training::{
        ModelRegistry, ModelReport, ModelSelector, RegressionMetrics, Regressor, RegressorModel,
        TrainerConfig,
    };

    // Optimization
    pub use crate::optimizer::{GridConfig, GridSearchCV, HyperparameterTuner};

    // Experiment tracking
    pub use crate::tracking::{EvaluationTracker, ExperimentTracker, TrackingConfig};

    // Pipeline
    pub use crate::pipeline::{ArtifactStore, PipelineConfig, PipelineStage, TrainingPipeline};

    // Inference
    pub use crate::inference::{InferenceEngine, RecordStore};
}
