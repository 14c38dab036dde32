//! Feature preprocessing
//!
//! Builds the column-wise transformer shared by training and serving:
//! - Numeric branch: median imputation, then standard scaling
//! - Categorical branch: mode imputation, one-hot encoding, then scaling
//!   without centering
//!
//! The fitted [`FeatureTransformer`] is the only object allowed to turn a raw
//! frame into a model matrix, so train, test and inference inputs are encoded
//! identically.

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::{TransformerConfig, UnknownCategoryPolicy};
pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, ImputeValue, Imputer};
pub use pipeline::{FeatureTransformer, TransformerBuilder};
pub use scaler::{Scaler, ScalerParams};

use crate::error::{PremiumError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column role inferred from its storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Classify a column by dtype: numbers are numeric, strings are categorical.
///
/// Anything else (booleans, dates, all-null columns, nested types) has no
/// unambiguous branch and is rejected.
pub fn classify_column(name: &str, dtype: &DataType) -> Result<ColumnKind> {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => Ok(ColumnKind::Numeric),
        DataType::String => Ok(ColumnKind::Categorical),
        other => Err(PremiumError::PreprocessingError(format!(
            "column '{}' has ambiguous dtype {:?}",
            name, other
        ))),
    }
}

/// Extract named numeric columns into a row-major matrix.
///
/// Columns are cast to Float64; a remaining null is an error because every
/// caller imputes before extracting.
pub(crate) fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| PremiumError::FeatureNotFound(col_name.clone()))?;
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            series
                .f64()?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        PremiumError::ValidationError(format!("null value left in column '{}'", col_name))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}
