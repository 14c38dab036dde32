//! Pipeline configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PremiumError, Result};
use crate::preprocessing::TransformerConfig;
use crate::tracking::TrackingConfig;
use crate::training::TrainerConfig;

/// Everything one training run needs, built once and then only borrowed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source dataset
    pub raw_data_path: PathBuf,

    /// Directory receiving the cleaned data, the transformer and the model
    pub artifact_root: PathBuf,

    /// Directory receiving one log file per run
    pub log_dir: PathBuf,

    /// Column holding the premium
    pub target_column: String,

    /// Share of rows held out for testing
    pub test_fraction: f64,

    /// Seed for the split and every randomized model; `trainer.random_seed`
    /// always follows it
    pub random_seed: u64,

    pub transformer: TransformerConfig,
    pub trainer: TrainerConfig,
    pub tracking: TrackingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from("research/insurance.csv"),
            artifact_root: PathBuf::from("artifacts"),
            log_dir: PathBuf::from("logs"),
            target_column: "expenses".to_string(),
            test_fraction: 0.2,
            random_seed: 42,
            transformer: TransformerConfig::default(),
            trainer: TrainerConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PremiumError::ConfigError(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let mut config: PipelineConfig = serde_json::from_str(&json)
            .map_err(|e| PremiumError::ConfigError(format!("malformed config {}: {}", path.display(), e)))?;
        config.trainer.random_seed = config.random_seed;
        config.validate()?;
        Ok(config)
    }

    pub fn with_raw_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_data_path = path.into();
        self
    }

    pub fn with_artifact_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_root = path.into();
        self
    }

    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = path.into();
        self
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Sets the pipeline seed and the trainer seed together
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self.trainer.random_seed = seed;
        self
    }

    pub fn with_transformer(mut self, config: TransformerConfig) -> Self {
        self.transformer = config;
        self
    }

    /// The trainer keeps the pipeline seed
    pub fn with_trainer(mut self, config: TrainerConfig) -> Self {
        self.trainer = TrainerConfig {
            random_seed: self.random_seed,
            ..config
        };
        self
    }

    pub fn with_tracking(mut self, config: TrackingConfig) -> Self {
        self.tracking = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PremiumError::ConfigError("target_column is empty".to_string()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PremiumError::ConfigError(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        self.trainer.validate()
    }
}
