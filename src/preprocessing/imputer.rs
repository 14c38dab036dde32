//! Missing value imputation strategies

use crate::error::{PremiumError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{classify_column, ColumnKind};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with the most frequent value
    MostFrequent,
}

/// Fitted fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    Text(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fill value learned for a column, if any
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    /// Learn one fill value per column from the non-null entries
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PremiumError::FeatureNotFound(col_name.clone()))?;

            let fill_value = self.compute_fill_value(col_name, column.as_materialized_series())?;
            self.fill_values.insert(col_name.clone(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls in every fitted column present in `df`.
    ///
    /// Numeric columns that contain nulls come back as Float64; columns
    /// without nulls keep their dtype.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PremiumError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            if let Ok(col) = df.column(col_name) {
                if col.null_count() == 0 {
                    continue;
                }
                let filled = fill_series(col.as_materialized_series(), fill_value)?;
                result.with_column(filled)?;
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_fill_value(&self, name: &str, series: &Series) -> Result<ImputeValue> {
        let kind = classify_column(name, series.dtype())?;
        let no_values = || {
            PremiumError::PreprocessingError(format!("column '{}' has no observed values to impute from", name))
        };

        match (&self.strategy, kind) {
            (ImputeStrategy::Mean, ColumnKind::Numeric) => {
                let values = numeric_values(series)?;
                if values.is_empty() {
                    return Err(no_values());
                }
                Ok(ImputeValue::Numeric(values.iter().sum::<f64>() / values.len() as f64))
            }
            (ImputeStrategy::Median, ColumnKind::Numeric) => {
                let mut values = numeric_values(series)?;
                median(&mut values).map(ImputeValue::Numeric).ok_or_else(no_values)
            }
            (ImputeStrategy::MostFrequent, ColumnKind::Numeric) => {
                let mut values = numeric_values(series)?;
                numeric_mode(&mut values).map(ImputeValue::Numeric).ok_or_else(no_values)
            }
            (ImputeStrategy::MostFrequent, ColumnKind::Categorical) => {
                string_mode(series)?.map(ImputeValue::Text).ok_or_else(no_values)
            }
            (strategy, ColumnKind::Categorical) => Err(PremiumError::PreprocessingError(format!(
                "{:?} imputation needs a numeric column, '{}' is categorical",
                strategy, name
            ))),
        }
    }
}

fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let series = series.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().flatten().collect())
}

/// Median of the values; an even count averages the middle pair.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent value; ties resolve to the smallest.
fn numeric_mode(values: &mut [f64]) -> Option<f64> {
    values.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let run_start = i;
        while i < values.len() && values[i] == values[run_start] {
            i += 1;
        }
        let count = i - run_start;
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((values[run_start], count));
        }
    }
    best.map(|(v, _)| v)
}

/// Most frequent string; ties resolve to the lexicographically smallest.
fn string_mode(series: &Series) -> Result<Option<String>> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in series.str()?.into_iter().flatten() {
        *counts.entry(val).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((val, count));
        }
    }
    Ok(best.map(|(v, _)| v.to_string()))
}

fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
    match fill_value {
        ImputeValue::Numeric(val) => {
            let series = series.cast(&DataType::Float64)?;
            let filled: Float64Chunked = series
                .f64()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(*val)))
                .collect();

            Ok(filled.with_name(series.name().clone()).into_series())
        }
        ImputeValue::Text(val) => {
            let filled: StringChunked = series
                .str()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                .collect();

            Ok(filled.with_name(series.name().clone()).into_series())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(!imputer.is_fitted);
        assert!(imputer.transform(&DataFrame::empty()).is_err());
    }

    #[test]
    fn test_median_imputation_even_count() {
        let df = DataFrame::new(vec![Column::new(
            "bmi".into(),
            &[Some(20.0), None, Some(30.0), Some(22.0), Some(40.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &cols(&["bmi"])).unwrap();

        let col = result.column("bmi").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(26.0));
        assert_eq!(col.null_count(), 0);
    }

    #[test]
    fn test_integer_column_without_nulls_keeps_dtype() {
        let df = df!("age" => &[19i64, 33, 45]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &cols(&["age"])).unwrap();
        assert_eq!(result.column("age").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_most_frequent_string_tie_takes_smallest() {
        let df = DataFrame::new(vec![Column::new(
            "region".into(),
            &[Some("southwest"), Some("northeast"), None, Some("southwest"), Some("northeast")],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &cols(&["region"])).unwrap();

        assert_eq!(
            imputer.fill_value("region"),
            Some(&ImputeValue::Text("northeast".to_string()))
        );
        let col = result.column("region").unwrap().str().unwrap();
        assert_eq!(col.get(2), Some("northeast"));
    }

    #[test]
    fn test_numeric_mode() {
        let mut values = vec![3.0, 1.0, 3.0, 2.0, 1.0, 3.0];
        assert_eq!(numeric_mode(&mut values), Some(3.0));
        let mut tied = vec![5.0, 2.0];
        assert_eq!(numeric_mode(&mut tied), Some(2.0));
    }

    #[test]
    fn test_median_on_categorical_is_rejected() {
        let df = df!("sex" => &["male", "female"]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        assert!(imputer.fit(&df, &cols(&["sex"])).is_err());
    }

    #[test]
    fn test_all_null_column_is_rejected() {
        let df = DataFrame::new(vec![Column::new("bmi".into(), &[None::<f64>, None])]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let err = imputer.fit(&df, &cols(&["bmi"])).unwrap_err();
        assert!(matches!(err, PremiumError::PreprocessingError(_)));
    }
}
