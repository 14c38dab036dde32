//! Model training module
//!
//! Provides the regressor families the premium pipeline chooses between:
//! - Ordinary least squares
//! - Decision trees and random forests
//! - AdaBoost (R2) and gradient boosting
//!
//! plus the shared `Regressor` contract, a name-keyed registry, k-fold
//! splitting and holdout-based model selection.

mod models;
pub mod adaboost;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod random_forest;
pub mod registry;
pub mod selector;

pub use adaboost::{AdaBoostRegressor, BoostLoss};
pub use cross_validation::{CVResults, CVSplit, KFold};
pub use decision_tree::{DecisionTreeRegressor, MaxFeatures, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear_models::LinearRegression;
pub use models::{r2_score, ParamSet, ParamValue, RegressionMetrics, Regressor};
pub(crate) use models::{check_fit_input, check_predict_input};
pub use random_forest::RandomForestRegressor;
pub use registry::{ModelRegistry, RegressorModel, ROSTER};
pub use selector::{ModelReport, ModelSelector, Selection};
pub(crate) use selector::check_split;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PremiumError, Result};

/// Settings for selection and tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Folds used by the grid search
    pub cv_folds: usize,
    /// Worker threads for the grid search; `None` uses every core
    pub n_jobs: Option<usize>,
    /// Hyperparameter grid document
    pub grid_path: PathBuf,
    /// Seed handed to every randomized family
    pub random_seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            cv_folds: 3,
            n_jobs: None,
            grid_path: PathBuf::from("config/model_params.json"),
            random_seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub fn with_grid_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.grid_path = path.into();
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(PremiumError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(PremiumError::ConfigError("n_jobs must be positive".to_string()));
        }
        Ok(())
    }
}
