//! Transformer configuration

use serde::{Deserialize, Serialize};

use super::ImputeStrategy;

/// What to do with a categorical value that was never seen during fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnknownCategoryPolicy {
    /// Encode as an all-zero indicator block
    #[default]
    Ignore,
    /// Fail with `UnknownCategory`
    Error,
}

/// Configuration for the feature transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Strategy for missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Handling of categories outside the fitted vocabulary
    pub unknown_category: UnknownCategoryPolicy,

    /// Center numeric columns before scaling
    pub center_numeric: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            unknown_category: UnknownCategoryPolicy::Ignore,
            center_numeric: true,
        }
    }
}

impl TransformerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set the categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set the unknown-category policy
    pub fn with_unknown_category(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category = policy;
        self
    }
}
