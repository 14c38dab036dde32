//! Training orchestrator
//!
//! Runs ingestion, transformation, selection, tuning, tracking and
//! persistence strictly in that order. The first failing stage moves the
//! pipeline to `Failed` and its error is returned wrapped with the stage;
//! artifacts already written are left in place.

use std::path::PathBuf;

use tracing::{error, info};
use uuid::Uuid;

use super::{ArtifactStore, PipelineConfig, PipelineStage};
use crate::data::{target_values, DataIngestion};
use crate::error::{PremiumError, Result};
use crate::optimizer::HyperparameterTuner;
use crate::preprocessing::TransformerBuilder;
use crate::tracking::EvaluationTracker;
use crate::training::{ModelReport, ModelSelector, ParamSet, RegressionMetrics};
use crate::utils::LoggingContext;

/// Return early with the error wrapped in the current stage
macro_rules! stage_try {
    ($self:ident, $expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return Err($self.fail(err)),
        }
    };
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: String,
    pub model_report: ModelReport,
    pub best_model: String,
    /// Holdout R² of the best family before tuning
    pub untuned_score: f64,
    pub best_params: ParamSet,
    /// Holdout R² after tuning
    pub tuned_score: f64,
    pub metrics: RegressionMetrics,
    pub transformer_path: PathBuf,
    pub model_path: PathBuf,
    pub log_path: PathBuf,
}

/// One-shot training state machine
pub struct TrainingPipeline {
    config: PipelineConfig,
    logging: LoggingContext,
    stage: PipelineStage,
    history: Vec<PipelineStage>,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let logging = LoggingContext::new(&config.log_dir);
        Ok(Self {
            config,
            logging,
            stage: PipelineStage::Idle,
            history: vec![PipelineStage::Idle],
        })
    }

    /// Replace the per-run log destination
    pub fn with_logging(mut self, logging: LoggingContext) -> Self {
        self.logging = logging;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Every stage entered so far, starting with `Idle`
    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    /// Run the pipeline and return the tuned holdout score
    pub fn run(&mut self) -> Result<f64> {
        self.run_with_report().map(|report| report.tuned_score)
    }

    pub fn run_with_report(&mut self) -> Result<TrainingReport> {
        if self.stage != PipelineStage::Idle {
            return Err(PremiumError::InvalidInput(format!(
                "pipeline already ran and is in stage {}",
                self.stage
            )));
        }

        let guard = stage_try!(self, self.logging.install());
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, log = %guard.path().display(), "Training pipeline started");

        let config = self.config.clone();
        let store = ArtifactStore::new(&config.artifact_root);

        self.transition(PipelineStage::Ingesting);
        let ingestion = stage_try!(self, DataIngestion::from_config(&config));
        let data = stage_try!(self, ingestion.initiate());

        self.transition(PipelineStage::Transforming);
        let mut transformer = stage_try!(
            self,
            TransformerBuilder::new(&config.target_column)
                .with_config(config.transformer.clone())
                .build(&data.train)
        );
        let x_train = stage_try!(self, transformer.fit_transform(&data.train));
        let x_test = stage_try!(self, transformer.transform(&data.test));
        let y_train = stage_try!(self, target_values(&data.train, &config.target_column));
        let y_test = stage_try!(self, target_values(&data.test, &config.target_column));

        self.transition(PipelineStage::Selecting);
        let selector = stage_try!(self, ModelSelector::new(config.trainer.random_seed));
        let selection = stage_try!(self, selector.select(&x_train, &y_train, &x_test, &y_test));
        info!(report = ?selection.report, "Model report");

        self.transition(PipelineStage::Tuning);
        let tuner = stage_try!(self, HyperparameterTuner::from_config(&config.trainer));
        let tuned = stage_try!(
            self,
            tuner.tune(
                &selection.best_name,
                &selection.best_model,
                &x_train,
                &y_train,
                &x_test,
                &y_test
            )
        );

        self.transition(PipelineStage::Tracking);
        let evaluator = stage_try!(self, EvaluationTracker::new(&config.tracking));
        let evaluation = stage_try!(
            self,
            evaluator.evaluate(&x_train, &y_train, &x_test, &y_test, &tuned.model, &tuned.best_params)
        );

        self.transition(PipelineStage::Persisted);
        let transformer_path = stage_try!(self, store.save_transformer(&transformer, &run_id));
        let model_path = stage_try!(self, store.save_model(&tuned.model, &run_id));

        self.transition(PipelineStage::Done);
        info!(
            model = %selection.best_name,
            tuned_r2 = tuned.tuned_score,
            "Model training completed successfully"
        );

        Ok(TrainingReport {
            run_id,
            model_report: selection.report,
            best_model: selection.best_name,
            untuned_score: selection.best_score,
            best_params: tuned.best_params,
            tuned_score: tuned.tuned_score,
            metrics: evaluation.metrics,
            transformer_path,
            model_path,
            log_path: guard.path().to_path_buf(),
        })
    }

    fn transition(&mut self, next: PipelineStage) {
        info!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
        self.history.push(next);
    }

    #[track_caller]
    fn fail(&mut self, err: PremiumError) -> PremiumError {
        let stage = self.stage;
        error!(stage = %stage, error = %err, "Pipeline stage failed");
        self.transition(PipelineStage::Failed);
        err.in_stage(stage)
    }
}
