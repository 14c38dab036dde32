//! Regressor contract, hyperparameter values and regression metrics

use crate::error::{PremiumError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed hyperparameter value.
///
/// Deserialized untagged so grid documents can list plain JSON scalars;
/// `null` stands for "no limit" (e.g. an unbounded tree depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Hyperparameter name to value, ordered by name
pub type ParamSet = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// Returns the type name of this value as a static string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
        }
    }

    fn mismatch(&self, name: &str, expected: &str) -> PremiumError {
        PremiumError::InvalidParameter {
            name: name.to_string(),
            value: self.to_string(),
            reason: format!("expected {}, got {}", expected, self.type_name()),
        }
    }

    pub fn as_usize(&self, name: &str) -> Result<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as usize),
            _ => Err(self.mismatch(name, "non-negative int")),
        }
    }

    /// `null` maps to `None`
    pub fn as_opt_usize(&self, name: &str) -> Result<Option<usize>> {
        match self {
            ParamValue::Null => Ok(None),
            _ => self.as_usize(name).map(Some),
        }
    }

    /// Integers are accepted where floats are expected
    pub fn as_f64(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            _ => Err(self.mismatch(name, "number")),
        }
    }

    pub fn as_bool(&self, name: &str) -> Result<bool> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(name, "bool")),
        }
    }

    pub fn as_str(&self, name: &str) -> Result<&str> {
        match self {
            ParamValue::String(s) => Ok(s),
            _ => Err(self.mismatch(name, "string")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "None"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<Option<usize>> for ParamValue {
    fn from(v: Option<usize>) -> Self {
        v.map_or(ParamValue::Null, ParamValue::from)
    }
}

/// Error for a hyperparameter name a family does not declare
pub(crate) fn unknown_param(family: &str, name: &str, value: &ParamValue) -> PremiumError {
    PremiumError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: format!("not a hyperparameter of {}", family),
    }
}

/// Shared contract of every regressor family
pub trait Regressor: Send + Sync {
    /// Registry key of the family
    fn name(&self) -> &'static str;

    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Current hyperparameters
    fn params(&self) -> ParamSet;

    /// Set one hyperparameter; unknown names or wrong types are rejected
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    fn is_fitted(&self) -> bool;

    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        for (name, value) in params {
            self.set_param(name, value)?;
        }
        Ok(())
    }

    /// Coefficient of determination on `(x, y)`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(r2_score(y, &predictions))
    }
}

/// Coefficient of determination.
///
/// With a constant target the score is 1.0 for a perfect prediction and
/// 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Metrics recorded for the final model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PremiumError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PremiumError::ValidationError(
                "cannot compute metrics on zero samples".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            rmse: mse.sqrt(),
            mae,
            r2: r2_score(y_true, y_pred),
        })
    }
}

/// Checks shared by every `fit`
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PremiumError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PremiumError::TrainingError("cannot fit on zero samples".to_string()));
    }
    Ok(())
}

/// Checks shared by every `predict`
pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PremiumError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!((metrics.mae - 0.5).abs() < 1e-12);
        assert!((metrics.rmse - 0.375f64.sqrt()).abs() < 1e-12);
        assert!((metrics.r2 - 0.948_608_137_044_967_9).abs() < 1e-9);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![5.0, 5.0];
        assert_eq!(r2_score(&y, &array![5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&y, &array![4.0, 6.0]), 0.0);
    }

    #[test]
    fn test_metrics_length_mismatch() {
        assert!(RegressionMetrics::compute(&array![1.0, 2.0], &array![1.0]).is_err());
    }

    #[test]
    fn test_param_value_from_json() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[null, 3, 0.1, true, "linear"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Null,
                ParamValue::Int(3),
                ParamValue::Float(0.1),
                ParamValue::Bool(true),
                ParamValue::String("linear".to_string()),
            ]
        );
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::Int(8).as_f64("learning_rate").unwrap(), 8.0);
        assert_eq!(ParamValue::Null.as_opt_usize("max_depth").unwrap(), None);
        assert!(ParamValue::Int(-1).as_usize("n_estimators").is_err());
        assert!(matches!(
            ParamValue::String("x".into()).as_bool("fit_intercept"),
            Err(PremiumError::InvalidParameter { .. })
        ));
        assert_eq!(ParamValue::Null.to_string(), "None");
    }
}
