//! Experiment Tracking Module
//!
//! Records each training run's parameters, metrics and model artifact to an
//! append-only log, and evaluates the final model before recording it.

mod evaluation;
mod storage;
mod tracker;

pub use evaluation::{EvaluationRecord, EvaluationTracker, REGISTERED_MODEL_TAG};
pub use storage::{LocalStorage, StorageBackend};
pub use tracker::{ArtifactEntry, Experiment, ExperimentTracker, Run, RunStatus};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for experiment tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Directory holding the experiment log
    pub experiment_root: PathBuf,
    pub experiment_name: String,
    /// Treat the log as a model registry and tag model artifacts with their family
    pub model_registry: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            experiment_root: PathBuf::from("mlruns"),
            experiment_name: "insurance-premium".to_string(),
            model_registry: false,
        }
    }
}
