//! AdaBoost regressor (AdaBoost.R2)
//!
//! Each round fits a depth-limited regression tree on a weighted bootstrap
//! of the training set, then raises the weight of samples with large
//! relative error. Predictions are the weighted median of the ensemble.

use crate::error::{PremiumError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::DecisionTreeRegressor;
use super::models::{check_fit_input, check_predict_input, unknown_param, ParamSet, ParamValue, Regressor};

/// Depth of each weak learner
const BASE_MAX_DEPTH: usize = 3;

/// Per-sample loss applied to normalized absolute errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostLoss {
    Linear,
    Square,
    Exponential,
}

impl BoostLoss {
    fn apply(&self, e: f64) -> f64 {
        match self {
            BoostLoss::Linear => e,
            BoostLoss::Square => e * e,
            BoostLoss::Exponential => 1.0 - (-e).exp(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            BoostLoss::Linear => "linear",
            BoostLoss::Square => "square",
            BoostLoss::Exponential => "exponential",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub loss: BoostLoss,
    pub random_state: u64,
    estimators: Vec<DecisionTreeRegressor>,
    estimator_weights: Vec<f64>,
    n_features: usize,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            loss: BoostLoss::Linear,
            random_state: 42,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_loss(mut self, loss: BoostLoss) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Number of weak learners kept after early stopping
    pub fn n_fitted_estimators(&self) -> usize {
        self.estimators.len()
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PremiumError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(PremiumError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Regressor for AdaBoostRegressor {
    fn name(&self) -> &'static str {
        "AdaBoostRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.validate()?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.estimators.clear();
        self.estimator_weights.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut sample_weight = vec![1.0 / n_samples as f64; n_samples];

        for round in 0..self.n_estimators {
            let sampler = WeightedIndex::new(&sample_weight)
                .map_err(|e| PremiumError::TrainingError(format!("invalid sample weights: {}", e)))?;
            let indices: Vec<usize> = (0..n_samples).map(|_| sampler.sample(&mut rng)).collect();

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(BASE_MAX_DEPTH)
                .with_random_state(rng.next_u64());
            tree.fit(&x.select(Axis(0), &indices), &y.select(Axis(0), &indices))?;

            let predictions = tree.predict(x)?;
            let abs_errors: Vec<f64> = predictions
                .iter()
                .zip(y.iter())
                .map(|(p, t)| (p - t).abs())
                .collect();
            let error_max = abs_errors.iter().cloned().fold(0.0, f64::max);

            let losses: Vec<f64> = abs_errors
                .iter()
                .map(|e| {
                    let normalized = if error_max > 0.0 { e / error_max } else { *e };
                    self.loss.apply(normalized)
                })
                .collect();
            let estimator_error: f64 = losses.iter().zip(&sample_weight).map(|(l, w)| l * w).sum();

            if estimator_error <= 0.0 {
                // perfect fit on the full training set
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                debug!(round, "AdaBoost stopped early on a perfect fit");
                break;
            }

            if estimator_error >= 0.5 {
                // worse than chance; only kept when nothing else exists
                if self.estimators.is_empty() {
                    self.estimators.push(tree);
                    self.estimator_weights.push(1.0);
                }
                debug!(round, estimator_error, "AdaBoost stopped on a weak learner");
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            let estimator_weight = self.learning_rate * (1.0 / beta).ln();

            self.estimators.push(tree);
            self.estimator_weights.push(estimator_weight);

            if round + 1 < self.n_estimators {
                for (w, l) in sample_weight.iter_mut().zip(&losses) {
                    *w *= beta.powf((1.0 - l) * self.learning_rate);
                }
                let total: f64 = sample_weight.iter().sum();
                if !(total > 0.0) {
                    break;
                }
                for w in &mut sample_weight {
                    *w /= total;
                }
            }
        }

        Ok(())
    }

    /// Weighted median of the weak learners' predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.estimators.is_empty() {
            return Err(PremiumError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let all_predictions = self
            .estimators
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        let total_weight: f64 = self.estimator_weights.iter().sum();
        let predictions = (0..x.nrows())
            .map(|i| {
                let mut pairs: Vec<(f64, f64)> = all_predictions
                    .iter()
                    .zip(&self.estimator_weights)
                    .map(|(p, &w)| (p[i], w))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

                let half = 0.5 * total_weight;
                let mut cumulative = 0.0;
                for &(value, weight) in &pairs {
                    cumulative += weight;
                    if cumulative >= half {
                        return value;
                    }
                }
                pairs[pairs.len() - 1].0
            })
            .collect::<Vec<f64>>();

        Ok(Array1::from_vec(predictions))
    }

    fn params(&self) -> ParamSet {
        ParamSet::from([
            ("n_estimators".to_string(), ParamValue::from(self.n_estimators)),
            ("learning_rate".to_string(), ParamValue::from(self.learning_rate)),
            ("loss".to_string(), ParamValue::from(self.loss.as_str())),
            ("random_state".to_string(), ParamValue::Int(self.random_state as i64)),
        ])
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = value.as_usize(name)?,
            "learning_rate" => self.learning_rate = value.as_f64(name)?,
            "loss" => {
                self.loss = match value.as_str(name)? {
                    "linear" => BoostLoss::Linear,
                    "square" => BoostLoss::Square,
                    "exponential" => BoostLoss::Exponential,
                    _ => {
                        return Err(PremiumError::InvalidParameter {
                            name: name.to_string(),
                            value: value.to_string(),
                            reason: "expected linear, square or exponential".to_string(),
                        })
                    }
                }
            }
            "random_state" => self.random_state = value.as_usize(name)? as u64,
            _ => return Err(unknown_param(self.name(), name, value)),
        }
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }
}
