//! One-hot encoding for categorical columns

use crate::error::{PremiumError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::UnknownCategoryPolicy;

/// Vocabulary learned for one column, sorted ascending
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnVocabulary {
    column: String,
    categories: Vec<String>,
}

/// One-hot encoder producing one indicator column per fitted category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    unknown: UnknownCategoryPolicy,
    vocabularies: Vec<ColumnVocabulary>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new(unknown: UnknownCategoryPolicy) -> Self {
        Self {
            unknown,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the sorted category set of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.vocabularies = columns
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| PremiumError::FeatureNotFound(col_name.clone()))?;
                let categories: BTreeSet<String> = column
                    .as_materialized_series()
                    .str()?
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                Ok(ColumnVocabulary {
                    column: col_name.clone(),
                    categories: categories.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Total number of indicator columns
    pub fn n_outputs(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Output names as `<column>_<category>`, in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| v.categories.iter().map(move |c| format!("{}_{}", v.column, c)))
            .collect()
    }

    /// Categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }

    /// Encode the fitted columns of `df` into an indicator matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PremiumError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;

        for vocab in &self.vocabularies {
            let column = df
                .column(&vocab.column)
                .map_err(|_| PremiumError::FeatureNotFound(vocab.column.clone()))?;
            let ca = column.as_materialized_series().str()?;

            for (row, val) in ca.into_iter().enumerate() {
                let position = val.and_then(|v| vocab.categories.binary_search_by(|c| c.as_str().cmp(v)).ok());
                match (position, self.unknown) {
                    (Some(idx), _) => out[[row, offset + idx]] = 1.0,
                    (None, UnknownCategoryPolicy::Ignore) => {}
                    (None, UnknownCategoryPolicy::Error) => {
                        return Err(PremiumError::UnknownCategory {
                            column: vocab.column.clone(),
                            value: val.unwrap_or("<null>").to_string(),
                        });
                    }
                }
            }

            offset += vocab.categories.len();
        }

        Ok(out)
    }
}
