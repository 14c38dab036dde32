//! Hyperparameter tuning of the selected model family

use ndarray::{Array1, Array2};
use tracing::info;

use super::grid::GridConfig;
use super::grid_search::{GridSearchCV, GridSearchResults};
use crate::error::{PremiumError, Result};
use crate::training::{check_split, ParamSet, Regressor, RegressorModel, TrainerConfig};

/// Result of [`HyperparameterTuner::tune`]
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    /// Winning grid point
    pub best_params: ParamSet,
    /// Holdout R² of the refitted model
    pub tuned_score: f64,
    pub model: RegressorModel,
    pub search: GridSearchResults,
}

/// Looks up the family's grid, searches it and rescores on the holdout set
#[derive(Debug, Clone)]
pub struct HyperparameterTuner {
    grids: GridConfig,
    cv_folds: usize,
    n_jobs: Option<usize>,
}

impl HyperparameterTuner {
    pub fn new(grids: GridConfig, config: &TrainerConfig) -> Self {
        Self {
            grids,
            cv_folds: config.cv_folds,
            n_jobs: config.n_jobs,
        }
    }

    /// Read the grid document named by the config
    pub fn from_config(config: &TrainerConfig) -> Result<Self> {
        let grids = GridConfig::from_file(&config.grid_path)?;
        Ok(Self::new(grids, config))
    }

    pub fn grids(&self) -> &GridConfig {
        &self.grids
    }

    pub fn tune(
        &self,
        family: &str,
        model: &RegressorModel,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<TuningOutcome> {
        check_split(x_train, y_train, x_test, y_test)?;
        if model.name() != family {
            return Err(PremiumError::InvalidInput(format!(
                "model is a {}, asked to tune {}",
                model.name(),
                family
            )));
        }

        let grid = self.grids.grid_for(family)?.clone();
        let search = GridSearchCV::new(model.clone(), grid)
            .with_cv_folds(self.cv_folds)
            .with_n_jobs(self.n_jobs);
        let (tuned, results) = search.fit(x_train, y_train)?;

        let tuned_score = tuned.score(x_test, y_test)?;
        info!(model = family, r2 = tuned_score, "tuned holdout score");

        Ok(TuningOutcome {
            best_params: results.best_params().clone(),
            tuned_score,
            model: tuned,
            search: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{ModelRegistry, ParamValue};

    fn grids() -> GridConfig {
        GridConfig::from_json(r#"{"DecisionTreeRegressor": {"max_depth": [1, 3]}}"#).unwrap()
    }

    fn data(start: usize, n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| ((start + i) % 20) as f64);
        let y = x.column(0).mapv(|v| (v / 4.0).floor() * 10.0);
        (x, y)
    }

    #[test]
    fn test_tune_decision_tree() {
        let (x_train, y_train) = data(0, 40);
        let (x_test, y_test) = data(3, 10);
        let model = ModelRegistry::create("DecisionTreeRegressor").unwrap();

        let tuner = HyperparameterTuner::new(grids(), &TrainerConfig::default());
        let outcome = tuner
            .tune("DecisionTreeRegressor", &model, &x_train, &y_train, &x_test, &y_test)
            .unwrap();

        assert_eq!(outcome.best_params["max_depth"], ParamValue::Int(3));
        assert_eq!(outcome.search.candidates.len(), 2);
        assert!(outcome.tuned_score > 0.99);
    }

    #[test]
    fn test_missing_grid_entry() {
        let (x, y) = data(0, 12);
        let model = ModelRegistry::create("LinearRegression").unwrap();
        let tuner = HyperparameterTuner::new(grids(), &TrainerConfig::default());
        assert!(matches!(
            tuner.tune("LinearRegression", &model, &x, &y, &x, &y),
            Err(PremiumError::ConfigError(_))
        ));
    }

    #[test]
    fn test_family_must_match_model() {
        let (x, y) = data(0, 12);
        let model = ModelRegistry::create("LinearRegression").unwrap();
        let tuner = HyperparameterTuner::new(grids(), &TrainerConfig::default());
        assert!(tuner.tune("DecisionTreeRegressor", &model, &x, &y, &x, &y).is_err());
    }
}
