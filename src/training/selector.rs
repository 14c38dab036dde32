//! Model selection over the registered roster

use std::time::Instant;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::models::Regressor;
use super::registry::{ModelRegistry, RegressorModel};
use crate::error::{PremiumError, Result};

/// Holdout score per family, in the order the families were trained
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    entries: Vec<(String, f64)>,
}

impl ModelReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, score: f64) {
        self.entries.push((name.into(), score));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score; the first family reaching it wins ties
    pub fn best(&self) -> Option<(&str, f64)> {
        self.best_position()
            .map(|i| (self.entries[i].0.as_str(), self.entries[i].1))
    }

    fn best_position(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, (_, score)) in self.entries.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some(b) if !(*score > self.entries[b].1) => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// Output of [`ModelSelector::select`]
#[derive(Debug, Clone)]
pub struct Selection {
    pub report: ModelReport,
    pub best_name: String,
    pub best_model: RegressorModel,
    pub best_score: f64,
}

/// Trains every candidate on the same split and keeps the best holdout R²
#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<RegressorModel>,
}

impl ModelSelector {
    /// Full roster with default hyperparameters
    pub fn new(seed: u64) -> Result<Self> {
        Ok(Self {
            candidates: ModelRegistry::roster(seed)?,
        })
    }

    /// Custom candidate list, evaluated in the given order
    pub fn with_candidates(candidates: Vec<RegressorModel>) -> Self {
        Self { candidates }
    }

    pub fn select(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<Selection> {
        check_split(x_train, y_train, x_test, y_test)?;
        if self.candidates.is_empty() {
            return Err(PremiumError::ConfigError("no candidate models to select from".to_string()));
        }

        let mut report = ModelReport::new();
        let mut fitted = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let start = Instant::now();
            let mut model = candidate.clone();
            model.fit(x_train, y_train)?;
            let score = model.score(x_test, y_test)?;

            debug!(model = model.name(), elapsed_ms = start.elapsed().as_millis() as u64, "fitted candidate");
            info!(model = model.name(), r2 = score, "holdout score");

            report.insert(model.name(), score);
            fitted.push(model);
        }

        let position = report
            .best_position()
            .ok_or_else(|| PremiumError::TrainingError("every candidate produced a NaN score".to_string()))?;
        let best_score = report.entries[position].1;
        let best_model = fitted.swap_remove(position);
        let best_name = best_model.name().to_string();

        info!(model = %best_name, r2 = best_score, "best model selected");
        Ok(Selection {
            report,
            best_name,
            best_model,
            best_score,
        })
    }
}

/// Row counts must agree within each partition and widths across them
pub(crate) fn check_split(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<()> {
    if x_train.nrows() != y_train.len() || x_test.nrows() != y_test.len() {
        return Err(PremiumError::ShapeError {
            expected: format!("{} train / {} test targets", x_train.nrows(), x_test.nrows()),
            actual: format!("{} train / {} test targets", y_train.len(), y_test.len()),
        });
    }
    if x_train.ncols() != x_test.ncols() {
        return Err(PremiumError::ShapeError {
            expected: format!("{} test features", x_train.ncols()),
            actual: format!("{} test features", x_test.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::decision_tree::DecisionTreeRegressor;
    use crate::training::linear_models::LinearRegression;
    use ndarray::array;

    fn linear_data(start: usize, n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let i = start + i;
            if j == 0 { i as f64 } else { ((i * 7) % 5) as f64 }
        });
        let y = x.column(0).mapv(|v| 3.0 * v) + &x.column(1).mapv(|v| 2.0 * v) + 1.0;
        (x, y)
    }

    #[test]
    fn test_report_best_takes_first_maximum() {
        let mut report = ModelReport::new();
        report.insert("a", 0.5);
        report.insert("b", 0.9);
        report.insert("c", 0.9);
        report.insert("d", f64::NAN);
        assert_eq!(report.best(), Some(("b", 0.9)));
        assert_eq!(report.get("c"), Some(0.9));
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn test_select_linear_target() {
        // holdout rows lie outside the training range, where trees cannot extrapolate
        let (x_train, y_train) = linear_data(0, 30);
        let (x_test, y_test) = linear_data(30, 10);

        let selection = ModelSelector::new(42).unwrap().select(&x_train, &y_train, &x_test, &y_test).unwrap();
        assert_eq!(selection.report.len(), 5);
        assert_eq!(selection.best_name, "LinearRegression");
        assert!(selection.best_score > 0.999);

        let max = selection.report.iter().map(|(_, s)| s).fold(f64::MIN, f64::max);
        assert_eq!(selection.best_score, max);
        assert_eq!(selection.report.get(&selection.best_name), Some(max));
        assert!(selection.best_model.is_fitted());
    }

    #[test]
    fn test_tie_goes_to_roster_order() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 10.0, 10.0];
        let selector = ModelSelector::with_candidates(vec![
            RegressorModel::DecisionTreeRegressor(DecisionTreeRegressor::new()),
            RegressorModel::LinearRegression(LinearRegression::new()),
            RegressorModel::DecisionTreeRegressor(DecisionTreeRegressor::new().with_max_depth(1)),
        ]);
        let selection = selector.select(&x, &y, &x, &y).unwrap();
        assert_eq!(selection.best_score, 1.0);
        assert_eq!(selection.best_name, "DecisionTreeRegressor");
        assert_eq!(selection.best_model.params()["max_depth"], crate::training::ParamValue::Null);
    }

    #[test]
    fn test_shape_mismatch() {
        let (x, y) = linear_data(0, 10);
        let short = y.slice(ndarray::s![..5]).to_owned();
        assert!(ModelSelector::new(0).unwrap().select(&x, &short, &x, &y).is_err());
    }
}
