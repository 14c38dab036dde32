//! Feature scaling on encoded matrices

use crate::error::{PremiumError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

/// Standard scaler: `(x - mean) / std`, or `x / std` without centering.
///
/// Uses the population standard deviation. A constant column gets scale 1
/// so it maps to zero instead of NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    with_mean: bool,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new standard scaler
    pub fn new(with_mean: bool) -> Self {
        Self {
            with_mean,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    /// Fit per-column mean and standard deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(PremiumError::PreprocessingError(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|col| {
                let mean = col.sum() / n as f64;
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
                let std = var.sqrt();
                ScalerParams {
                    center: if self.with_mean { mean } else { 0.0 },
                    scale: if std > f64::EPSILON { std } else { 1.0 },
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted scaling column by column
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PremiumError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(PremiumError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (mut col, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            col.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
