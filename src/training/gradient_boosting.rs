//! Gradient boosting regressor
//!
//! Least-squares boosting: each round fits a shallow regression tree to the
//! current residuals and adds its shrunken prediction to the ensemble.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTreeRegressor;
use super::models::{check_fit_input, check_predict_input, unknown_param, ParamSet, ParamValue, Regressor};
use crate::error::{PremiumError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio for each tree
    pub subsample: f64,
    /// Random seed
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: 42,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    initial_prediction: f64,
    n_features: usize,
    is_fitted: bool,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            is_fitted: false,
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| PremiumError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };
        if self.config.n_estimators == 0 {
            return Err(invalid("n_estimators", "0".into(), "must be positive"));
        }
        if !(self.config.learning_rate > 0.0) {
            return Err(invalid("learning_rate", self.config.learning_rate.to_string(), "must be positive"));
        }
        if !(self.config.subsample > 0.0 && self.config.subsample <= 1.0) {
            return Err(invalid("subsample", self.config.subsample.to_string(), "must be in (0, 1]"));
        }
        Ok(())
    }

    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        if self.config.subsample < 1.0 {
            let sample_size = ((n as f64) * self.config.subsample).ceil() as usize;
            indices.shuffle(rng);
            indices.truncate(sample_size.max(1));
            indices.sort_unstable();
        }
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn name(&self) -> &'static str {
        "GradientBoostingRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        self.initial_prediction = y.sum() / n_samples as f64;
        self.trees.clear();
        self.n_features = n_features;

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        for round in 0..self.config.n_estimators {
            let residuals = y - &predictions;
            let sample_indices = self.subsample_indices(n_samples, &mut rng);

            let x_sub = x.select(Axis(0), &sample_indices);
            let y_sub = residuals.select(Axis(0), &sample_indices);

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_random_state(self.config.random_state.wrapping_add(round as u64));
            tree.fit(&x_sub, &y_sub)?;

            // every row moves, including those left out of the subsample
            let tree_pred = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);

            self.trees.push(tree);
        }

        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(PremiumError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
        }
        Ok(predictions)
    }

    fn params(&self) -> ParamSet {
        let c = &self.config;
        ParamSet::from([
            ("n_estimators".to_string(), ParamValue::from(c.n_estimators)),
            ("learning_rate".to_string(), ParamValue::from(c.learning_rate)),
            ("max_depth".to_string(), ParamValue::from(c.max_depth)),
            ("min_samples_leaf".to_string(), ParamValue::from(c.min_samples_leaf)),
            ("subsample".to_string(), ParamValue::from(c.subsample)),
            ("random_state".to_string(), ParamValue::Int(c.random_state as i64)),
        ])
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.config.n_estimators = value.as_usize(name)?,
            "learning_rate" => self.config.learning_rate = value.as_f64(name)?,
            "max_depth" => self.config.max_depth = value.as_usize(name)?,
            "min_samples_leaf" => self.config.min_samples_leaf = value.as_usize(name)?,
            "subsample" => self.config.subsample = value.as_f64(name)?,
            "random_state" => self.config.random_state = value.as_usize(name)? as u64,
            _ => return Err(unknown_param(self.name(), name, value)),
        }
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
