//! Hyperparameter optimization module
//!
//! Provides exhaustive grid search with k-fold cross-validation:
//! - Grid documents keyed by model family
//! - Parallel candidate × fold evaluation on a bounded thread pool
//! - Refit of the winning configuration and holdout rescoring

pub mod grid;
pub mod grid_search;
pub mod tuner;

pub use grid::{expand_grid, GridConfig, ParamGrid};
pub use grid_search::{CandidateResult, GridSearchCV, GridSearchResults};
pub use tuner::{HyperparameterTuner, TuningOutcome};
