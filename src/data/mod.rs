//! Dataset ingestion, splitting and the typed input record

mod ingestion;
mod record;
mod split;

pub use ingestion::{DataIngestion, IngestionOutput, MissingValueTreatment};
pub use record::{CustomerRecord, Region, Sex, Smoker, FEATURE_COLUMNS};
pub use split::TrainTestSplit;

use crate::error::{PremiumError, Result};
use ndarray::Array1;
use polars::prelude::*;

/// Extract the target column as a dense vector; nulls are rejected.
pub fn target_values(df: &DataFrame, target_column: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target_column)
        .map_err(|_| PremiumError::FeatureNotFound(target_column.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| PremiumError::DataError(format!("null target in column '{}'", target_column)))
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from_vec)
}

/// Null cells across all columns
pub fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}
