//! Column-wise feature transformer

use crate::error::{PremiumError, Result};
use super::{
    classify_column, columns_to_array2,
    config::TransformerConfig,
    encoder::OneHotEncoder,
    imputer::Imputer,
    scaler::Scaler,
    ColumnKind,
};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Inspects a training frame and assembles an unfitted [`FeatureTransformer`]
#[derive(Debug, Clone)]
pub struct TransformerBuilder {
    target_column: String,
    config: TransformerConfig,
}

impl TransformerBuilder {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            config: TransformerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TransformerConfig) -> Self {
        self.config = config;
        self
    }

    /// Classify every non-target column and wire up both branches.
    ///
    /// Fails if the target column is absent or a column's dtype is neither
    /// numeric nor string.
    pub fn build(&self, df: &DataFrame) -> Result<FeatureTransformer> {
        if df.column(&self.target_column).is_err() {
            return Err(PremiumError::DataError(format!(
                "target column '{}' not found",
                self.target_column
            )));
        }

        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();

        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == self.target_column {
                continue;
            }
            match classify_column(name, col.dtype())? {
                ColumnKind::Numeric => numeric_columns.push(name.to_string()),
                ColumnKind::Categorical => categorical_columns.push(name.to_string()),
            }
        }

        debug!(
            numeric = ?numeric_columns,
            categorical = ?categorical_columns,
            "Classified input columns"
        );

        Ok(FeatureTransformer {
            target_column: self.target_column.clone(),
            numeric_imputer: Imputer::new(self.config.numeric_impute_strategy.clone()),
            numeric_scaler: Scaler::new(self.config.center_numeric),
            categorical_imputer: Imputer::new(self.config.categorical_impute_strategy.clone()),
            encoder: OneHotEncoder::new(self.config.unknown_category),
            categorical_scaler: Scaler::new(false),
            numeric_columns,
            categorical_columns,
            config: self.config.clone(),
            is_fitted: false,
        })
    }
}

/// Fitted mapping from raw frames to model matrices.
///
/// Output columns: numeric branch first (input order), then each categorical
/// column's one-hot block (input order, categories sorted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTransformer {
    config: TransformerConfig,
    target_column: String,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    numeric_scaler: Scaler,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    categorical_scaler: Scaler,
    is_fitted: bool,
}

impl FeatureTransformer {
    /// Fit both branches on the training frame and return its encoding.
    ///
    /// A transformer is fitted exactly once; a second call is an error.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        if self.is_fitted {
            return Err(PremiumError::PreprocessingError(
                "transformer is already fitted".to_string(),
            ));
        }
        self.check_columns(df)?;

        self.numeric_imputer.fit(df, &self.numeric_columns)?;
        let filled = self.numeric_imputer.transform(df)?;
        let numeric = columns_to_array2(&filled, &self.numeric_columns)?;
        let numeric = self.numeric_scaler.fit_transform(&numeric)?;

        self.categorical_imputer.fit(&filled, &self.categorical_columns)?;
        let filled = self.categorical_imputer.transform(&filled)?;
        self.encoder.fit(&filled, &self.categorical_columns)?;
        let categorical = self.encoder.transform(&filled)?;
        let categorical = self.categorical_scaler.fit_transform(&categorical)?;

        self.is_fitted = true;
        info!(
            rows = df.height(),
            features = self.n_features_out(),
            "Fitted feature transformer"
        );

        Ok(concatenate(Axis(1), &[numeric.view(), categorical.view()])?)
    }

    /// Encode a frame with the fitted statistics, without refitting
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PremiumError::ModelNotFitted);
        }
        self.check_columns(df)?;

        let filled = self.numeric_imputer.transform(df)?;
        let numeric = columns_to_array2(&filled, &self.numeric_columns)?;
        let numeric = self.numeric_scaler.transform(&numeric)?;

        let filled = self.categorical_imputer.transform(&filled)?;
        let categorical = self.encoder.transform(&filled)?;
        let categorical = self.categorical_scaler.transform(&categorical)?;

        Ok(concatenate(Axis(1), &[numeric.view(), categorical.view()])?)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Fitted numeric imputer (exposes the learned medians)
    pub fn numeric_imputer(&self) -> &Imputer {
        &self.numeric_imputer
    }

    /// Fitted categorical imputer (exposes the learned modes)
    pub fn categorical_imputer(&self) -> &Imputer {
        &self.categorical_imputer
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Width of the encoded matrix
    pub fn n_features_out(&self) -> usize {
        self.numeric_columns.len() + self.encoder.n_outputs()
    }

    /// Output column names in matrix order
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.encoder.feature_names())
            .collect()
    }

    /// Save the transformer to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a transformer from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let transformer: Self = serde_json::from_str(&json)?;
        Ok(transformer)
    }

    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        let missing: Vec<&str> = self
            .numeric_columns
            .iter()
            .chain(&self.categorical_columns)
            .filter(|name| df.column(name.as_str()).is_err())
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PremiumError::DataError(format!(
                "input is missing columns: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::UnknownCategoryPolicy;

    fn create_test_dataframe() -> DataFrame {
        df!(
            "age" => &[19i64, 33, 45, 60],
            "sex" => &["female", "male", "male", "female"],
            "bmi" => &[27.9, 22.7, 30.1, 25.0],
            "smoker" => &["yes", "no", "no", "no"],
            "expenses" => &[16884.92, 4449.46, 8240.59, 13000.0]
        )
        .unwrap()
    }

    #[test]
    fn test_column_detection_excludes_target() {
        let df = create_test_dataframe();
        let transformer = TransformerBuilder::new("expenses").build(&df).unwrap();

        assert_eq!(transformer.numeric_columns(), &["age", "bmi"]);
        assert_eq!(transformer.categorical_columns(), &["sex", "smoker"]);
        assert!(!transformer.is_fitted());
    }

    #[test]
    fn test_missing_target_fails() {
        let df = create_test_dataframe().drop("expenses").unwrap();
        assert!(TransformerBuilder::new("expenses").build(&df).is_err());
    }

    #[test]
    fn test_ambiguous_dtype_fails() {
        let mut df = create_test_dataframe();
        df.with_column(Series::new("insured".into(), &[true, false, true, true]))
            .unwrap();
        let err = TransformerBuilder::new("expenses").build(&df).unwrap_err();
        assert!(matches!(err, PremiumError::PreprocessingError(_)));
    }

    #[test]
    fn test_fit_transform_layout() {
        let df = create_test_dataframe();
        let mut transformer = TransformerBuilder::new("expenses").build(&df).unwrap();
        let x = transformer.fit_transform(&df).unwrap();

        assert_eq!(x.shape(), &[4, 6]);
        assert_eq!(
            transformer.feature_names(),
            vec!["age", "bmi", "sex_female", "sex_male", "smoker_no", "smoker_yes"]
        );
        // numeric columns are centered
        assert!(x.column(0).sum().abs() < 1e-9);
        // one-hot columns are scaled but not centered
        assert_eq!(x[[1, 2]], 0.0);
        assert!(x[[0, 2]] > 0.0);
    }

    #[test]
    fn test_fit_twice_is_rejected() {
        let df = create_test_dataframe();
        let mut transformer = TransformerBuilder::new("expenses").build(&df).unwrap();
        transformer.fit_transform(&df).unwrap();
        assert!(transformer.fit_transform(&df).is_err());
    }

    #[test]
    fn test_transform_before_fit() {
        let df = create_test_dataframe();
        let transformer = TransformerBuilder::new("expenses").build(&df).unwrap();
        assert!(matches!(transformer.transform(&df), Err(PremiumError::ModelNotFitted)));
    }

    #[test]
    fn test_transform_without_target_and_missing_column() {
        let df = create_test_dataframe();
        let mut transformer = TransformerBuilder::new("expenses").build(&df).unwrap();
        let fitted = transformer.fit_transform(&df).unwrap();

        let features = df.drop("expenses").unwrap();
        assert_eq!(transformer.transform(&features).unwrap(), fitted);

        let partial = features.drop("bmi").unwrap();
        assert!(transformer.transform(&partial).is_err());
    }

    #[test]
    fn test_strict_unknown_policy() {
        let df = create_test_dataframe();
        let config = TransformerConfig::default().with_unknown_category(UnknownCategoryPolicy::Error);
        let mut transformer = TransformerBuilder::new("expenses")
            .with_config(config)
            .build(&df)
            .unwrap();
        transformer.fit_transform(&df).unwrap();

        let record = df!(
            "age" => &[30i64],
            "sex" => &["other"],
            "bmi" => &[24.0],
            "smoker" => &["no"]
        )
        .unwrap();
        assert!(matches!(
            transformer.transform(&record),
            Err(PremiumError::UnknownCategory { .. })
        ));
    }
}
