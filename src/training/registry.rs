//! Name-keyed registry of the regressor families

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::adaboost::AdaBoostRegressor;
use super::decision_tree::DecisionTreeRegressor;
use super::gradient_boosting::GradientBoostingRegressor;
use super::linear_models::LinearRegression;
use super::models::{ParamSet, ParamValue, Regressor};
use super::random_forest::RandomForestRegressor;
use crate::error::{PremiumError, Result};

/// Candidate families in selection order
pub const ROSTER: [&str; 5] = [
    "LinearRegression",
    "DecisionTreeRegressor",
    "RandomForestRegressor",
    "AdaBoostRegressor",
    "GradientBoostingRegressor",
];

/// A regressor of any registered family.
///
/// This is the persisted form of a trained model: the variant tag names the
/// family, so a deserialized model dispatches to the right implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegressorModel {
    LinearRegression(LinearRegression),
    DecisionTreeRegressor(DecisionTreeRegressor),
    RandomForestRegressor(RandomForestRegressor),
    AdaBoostRegressor(AdaBoostRegressor),
    GradientBoostingRegressor(GradientBoostingRegressor),
}

impl RegressorModel {
    fn inner(&self) -> &dyn Regressor {
        match self {
            RegressorModel::LinearRegression(m) => m,
            RegressorModel::DecisionTreeRegressor(m) => m,
            RegressorModel::RandomForestRegressor(m) => m,
            RegressorModel::AdaBoostRegressor(m) => m,
            RegressorModel::GradientBoostingRegressor(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            RegressorModel::LinearRegression(m) => m,
            RegressorModel::DecisionTreeRegressor(m) => m,
            RegressorModel::RandomForestRegressor(m) => m,
            RegressorModel::AdaBoostRegressor(m) => m,
            RegressorModel::GradientBoostingRegressor(m) => m,
        }
    }

    /// Unfitted copy carrying the same hyperparameters
    pub fn fresh(&self) -> Result<Self> {
        let mut model = ModelRegistry::create(self.name())?;
        model.set_params(&self.params())?;
        Ok(model)
    }
}

impl Regressor for RegressorModel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn params(&self) -> ParamSet {
        self.inner().params()
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        self.inner_mut().set_param(name, value)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }
}

/// Factory for the registered families
pub struct ModelRegistry;

impl ModelRegistry {
    /// New model of the named family with default hyperparameters
    pub fn create(name: &str) -> Result<RegressorModel> {
        let model = match name {
            "LinearRegression" => RegressorModel::LinearRegression(LinearRegression::default()),
            "DecisionTreeRegressor" => RegressorModel::DecisionTreeRegressor(DecisionTreeRegressor::default()),
            "RandomForestRegressor" => RegressorModel::RandomForestRegressor(RandomForestRegressor::default()),
            "AdaBoostRegressor" => RegressorModel::AdaBoostRegressor(AdaBoostRegressor::default()),
            "GradientBoostingRegressor" => {
                RegressorModel::GradientBoostingRegressor(GradientBoostingRegressor::default())
            }
            other => {
                return Err(PremiumError::ConfigError(format!(
                    "unknown model family '{}', expected one of {:?}",
                    other, ROSTER
                )))
            }
        };
        Ok(model)
    }

    /// Every family in roster order, seeded where the family is randomized
    pub fn roster(seed: u64) -> Result<Vec<RegressorModel>> {
        ROSTER
            .iter()
            .map(|name| {
                let mut model = ModelRegistry::create(name)?;
                if model.params().contains_key("random_state") {
                    model.set_param("random_state", &ParamValue::Int(seed as i64))?;
                }
                Ok(model)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_create_every_family() {
        for name in ROSTER {
            let model = ModelRegistry::create(name).unwrap();
            assert_eq!(model.name(), name);
            assert!(!model.is_fitted());
        }
    }

    #[test]
    fn test_unknown_family_is_config_error() {
        assert!(matches!(
            ModelRegistry::create("SVR"),
            Err(PremiumError::ConfigError(_))
        ));
    }

    #[test]
    fn test_roster_order_and_seed() {
        let roster = ModelRegistry::roster(7).unwrap();
        let names: Vec<&str> = roster.iter().map(|m| m.name()).collect();
        assert_eq!(names, ROSTER.to_vec());
        for model in &roster {
            if let Some(seed) = model.params().get("random_state") {
                assert_eq!(seed, &ParamValue::Int(7), "{} not seeded", model.name());
            }
        }
    }

    #[test]
    fn test_unrepresentable_seed_is_an_error() {
        // random_state is read back as a usize, so a negative i64 is refused
        let err = ModelRegistry::roster(u64::MAX).unwrap_err();
        assert!(matches!(err, PremiumError::InvalidParameter { .. }));
    }

    #[test]
    fn test_serde_keeps_family() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = ModelRegistry::create("DecisionTreeRegressor").unwrap();
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: RegressorModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name(), "DecisionTreeRegressor");
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_persisted_trees_hold_only_prediction_state() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        for name in ["DecisionTreeRegressor", "RandomForestRegressor", "GradientBoostingRegressor"] {
            let mut model = ModelRegistry::create(name).unwrap();
            model.set_param("n_estimators", &ParamValue::Int(3)).ok();
            model.fit(&x, &y).unwrap();
            let json = serde_json::to_string(&model).unwrap();
            assert!(!json.contains("importances"), "{name} persists importances");
        }
    }

    #[test]
    fn test_fresh_keeps_params() {
        let mut model = ModelRegistry::create("GradientBoostingRegressor").unwrap();
        model.set_param("learning_rate", &ParamValue::Float(0.3)).unwrap();
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();

        let fresh = model.fresh().unwrap();
        assert!(!fresh.is_fitted());
        assert_eq!(fresh.params(), model.params());
    }
}
