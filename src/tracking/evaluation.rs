//! Final-model evaluation and experiment logging

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::{Array1, Array2};
use tracing::{info, warn};

use super::tracker::{ExperimentTracker, RunStatus};
use super::TrackingConfig;
use crate::error::Result;
use crate::training::{check_split, ParamSet, RegressionMetrics, Regressor, RegressorModel};

/// Tag naming the family of a model recorded in a registry-backed log
pub const REGISTERED_MODEL_TAG: &str = "registered_model_name";

/// What one evaluation wrote to the experiment log
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub run_id: String,
    pub metrics: RegressionMetrics,
    pub artifact_path: PathBuf,
    pub artifact_version: u32,
}

/// Refits the tuned model, scores it and records the run
pub struct EvaluationTracker {
    tracker: ExperimentTracker,
    model_registry: bool,
}

impl EvaluationTracker {
    pub fn new(config: &TrackingConfig) -> Result<Self> {
        Ok(Self {
            tracker: ExperimentTracker::new(config)?,
            model_registry: config.model_registry,
        })
    }

    pub fn with_tracker(tracker: ExperimentTracker, model_registry: bool) -> Self {
        Self { tracker, model_registry }
    }

    pub fn tracker(&self) -> &ExperimentTracker {
        &self.tracker
    }

    /// Log `params`, the rmse/mae/r2 of a refit of `model` and the model
    /// itself. The caller's model is left untouched.
    pub fn evaluate(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
        model: &RegressorModel,
        params: &ParamSet,
    ) -> Result<EvaluationRecord> {
        check_split(x_train, y_train, x_test, y_test)?;

        let run_id = self.tracker.start_run(model.name())?;
        match self.record(x_train, y_train, x_test, y_test, model, params) {
            Ok((metrics, artifact_path, artifact_version)) => {
                self.tracker.end_run(RunStatus::Finished)?;
                info!(run_id = %run_id, rmse = metrics.rmse, mae = metrics.mae, r2 = metrics.r2, "evaluation recorded");
                Ok(EvaluationRecord {
                    run_id,
                    metrics,
                    artifact_path,
                    artifact_version,
                })
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "evaluation failed");
                self.tracker.end_run(RunStatus::Failed)?;
                Err(err)
            }
        }
    }

    fn record(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
        model: &RegressorModel,
        params: &ParamSet,
    ) -> Result<(RegressionMetrics, PathBuf, u32)> {
        let mut refit = model.fresh()?;
        refit.set_params(params)?;
        refit.fit(x_train, y_train)?;
        let metrics = RegressionMetrics::compute(y_test, &refit.predict(x_test)?)?;

        for (name, value) in params {
            self.tracker.log_param(name.as_str(), value.to_string())?;
        }
        self.tracker.log_metric("rmse", metrics.rmse)?;
        self.tracker.log_metric("mae", metrics.mae)?;
        self.tracker.log_metric("r2", metrics.r2)?;

        let mut tags = BTreeMap::new();
        if self.model_registry {
            tags.insert(REGISTERED_MODEL_TAG.to_string(), refit.name().to_string());
        }
        let bytes = serde_json::to_vec(&refit)?;
        let entry = self.tracker.log_artifact("model", &bytes, tags)?;

        Ok((metrics, entry.path, entry.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{ModelRegistry, ParamValue};
    use ndarray::array;

    fn config(root: &std::path::Path, model_registry: bool) -> TrackingConfig {
        TrackingConfig {
            experiment_root: root.to_path_buf(),
            model_registry,
            ..Default::default()
        }
    }

    fn fitted_tree() -> (RegressorModel, ParamSet) {
        let mut model = ModelRegistry::create("DecisionTreeRegressor").unwrap();
        let params = ParamSet::from([("max_depth".to_string(), ParamValue::Int(2))]);
        model.set_params(&params).unwrap();
        (model, params)
    }

    #[test]
    fn test_evaluate_logs_params_metrics_and_model() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = EvaluationTracker::new(&config(dir.path(), false)).unwrap();
        let (model, params) = fitted_tree();

        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let record = evaluator.evaluate(&x, &y, &x, &y, &model, &params).unwrap();

        assert_eq!(record.metrics.r2, 1.0);
        assert_eq!(record.metrics.rmse, 0.0);
        assert!(record.artifact_path.exists());
        assert!(!model.is_fitted());

        let exp = evaluator.tracker().current_experiment().unwrap();
        let run = &exp.runs[0];
        assert_eq!(run.run_id, record.run_id);
        assert_eq!(run.params["max_depth"], "2");
        assert_eq!(run.metrics.len(), 3);
        assert!(run.artifacts[0].tags.is_empty());

        let stored: RegressorModel =
            serde_json::from_slice(&std::fs::read(&record.artifact_path).unwrap()).unwrap();
        assert_eq!(stored.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_registry_tags_family() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = EvaluationTracker::new(&config(dir.path(), true)).unwrap();
        let (model, params) = fitted_tree();
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        evaluator.evaluate(&x, &y, &x, &y, &model, &params).unwrap();

        let exp = evaluator.tracker().current_experiment().unwrap();
        assert_eq!(
            exp.runs[0].artifacts[0].tags[REGISTERED_MODEL_TAG],
            "DecisionTreeRegressor"
        );
    }

    #[test]
    fn test_failed_evaluation_marks_run() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = EvaluationTracker::new(&config(dir.path(), false)).unwrap();
        let (model, _) = fitted_tree();
        let bad = ParamSet::from([("alpha".to_string(), ParamValue::Float(1.0))]);
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];

        assert!(evaluator.evaluate(&x, &y, &x, &y, &model, &bad).is_err());
        let exp = evaluator.tracker().current_experiment().unwrap();
        assert_eq!(exp.runs[0].status, RunStatus::Failed);
    }
}
