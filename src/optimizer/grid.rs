//! Hyperparameter grid document
//!
//! The document maps each model family to the candidate values of its
//! tunable hyperparameters:
//!
//! ```json
//! { "DecisionTreeRegressor": { "max_depth": [3, 5, null] } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PremiumError, Result};
use crate::training::{ParamSet, ParamValue};

/// Candidate values per hyperparameter, ordered by parameter name
pub type ParamGrid = BTreeMap<String, Vec<ParamValue>>;

/// Grids for every tunable family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridConfig {
    families: BTreeMap<String, ParamGrid>,
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a grid document
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PremiumError::ConfigError(format!("cannot read grid document {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(json)
            .map_err(|e| PremiumError::ConfigError(format!("malformed grid document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_family(mut self, family: impl Into<String>, grid: ParamGrid) -> Self {
        self.families.insert(family.into(), grid);
        self
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Grid for `family`; a missing entry is a configuration error
    pub fn grid_for(&self, family: &str) -> Result<&ParamGrid> {
        self.families.get(family).ok_or_else(|| {
            PremiumError::ConfigError(format!("no hyperparameter grid configured for {}", family))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (family, grid) in &self.families {
            for (param, values) in grid {
                if values.is_empty() {
                    return Err(PremiumError::ConfigError(format!(
                        "{}.{} lists no candidate values",
                        family, param
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Every combination of the grid's values.
///
/// Parameters are taken in name order and the last one varies fastest. An
/// empty grid yields a single empty candidate.
pub fn expand_grid(grid: &ParamGrid) -> Vec<ParamSet> {
    let mut candidates = vec![ParamSet::new()];
    for (name, values) in grid {
        candidates = candidates
            .into_iter()
            .flat_map(|partial| {
                values.iter().map(move |value| {
                    let mut next = partial.clone();
                    next.insert(name.clone(), value.clone());
                    next
                })
            })
            .collect();
    }
    candidates
}
