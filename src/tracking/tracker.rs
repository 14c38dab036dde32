//! Experiment Tracker Implementation
//!
//! Track experiments, runs, parameters, metrics and artifacts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::storage::{LocalStorage, StorageBackend};
use super::TrackingConfig;
use crate::error::{PremiumError, Result};

/// A stored artifact of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub path: PathBuf,
    /// 1 for the first artifact of this name in the experiment
    pub version: u32,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run is currently running
    Running,
    /// Run completed successfully
    Finished,
    /// Run failed
    Failed,
}

/// A run within an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: String,
    pub start_time: DateTime<Utc>,
    /// `None` while still running
    pub end_time: Option<DateTime<Utc>>,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub tags: BTreeMap<String, String>,
    pub artifacts: Vec<ArtifactEntry>,
    pub status: RunStatus,
}

impl Run {
    /// Create a new run
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_name: run_name.into(),
            start_time: Utc::now(),
            end_time: None,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            tags: BTreeMap::new(),
            artifacts: Vec::new(),
            status: RunStatus::Running,
        }
    }
}

/// An experiment containing multiple runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub runs: Vec<Run>,
    pub tags: BTreeMap<String, String>,
}

impl Experiment {
    /// Create a new experiment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            experiment_id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            runs: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    fn artifact_versions(&self, name: &str) -> u32 {
        self.runs
            .iter()
            .flat_map(|r| r.artifacts.iter())
            .filter(|a| a.name == name)
            .count() as u32
    }
}

/// Append-only experiment log.
///
/// Finished runs are appended to their experiment and the whole log is
/// written back to storage; nothing already recorded is changed.
pub struct ExperimentTracker {
    storage: Box<dyn StorageBackend>,
    experiments: RwLock<Vec<Experiment>>,
    current_experiment: RwLock<Option<String>>,
    current_run: RwLock<Option<Run>>,
}

impl ExperimentTracker {
    /// Open the local log under `config.experiment_root` and select the
    /// configured experiment, creating it if needed
    pub fn new(config: &TrackingConfig) -> Result<Self> {
        let tracker = Self::with_storage(Box::new(LocalStorage::new(&config.experiment_root)))?;
        tracker.set_experiment(&config.experiment_name);
        Ok(tracker)
    }

    /// Use an explicit backend; previously stored experiments are loaded
    pub fn with_storage(storage: Box<dyn StorageBackend>) -> Result<Self> {
        let experiments = storage.load_experiments()?;
        Ok(Self {
            storage,
            experiments: RwLock::new(experiments),
            current_experiment: RwLock::new(None),
            current_run: RwLock::new(None),
        })
    }

    /// Select the experiment named `name`, creating it if needed
    pub fn set_experiment(&self, name: &str) -> String {
        let mut experiments = self.experiments.write();
        let experiment_id = match experiments.iter().find(|e| e.name == name) {
            Some(existing) => existing.experiment_id.clone(),
            None => {
                let experiment = Experiment::new(name);
                let id = experiment.experiment_id.clone();
                experiments.push(experiment);
                id
            }
        };
        *self.current_experiment.write() = Some(experiment_id.clone());
        experiment_id
    }

    /// Start a new run
    pub fn start_run(&self, run_name: impl Into<String>) -> Result<String> {
        if self.current_experiment.read().is_none() {
            return Err(PremiumError::InvalidInput("no experiment selected".to_string()));
        }
        let mut current = self.current_run.write();
        if let Some(active) = current.as_ref() {
            return Err(PremiumError::InvalidInput(format!("run {} is still active", active.run_id)));
        }
        let run = Run::new(run_name);
        let run_id = run.run_id.clone();
        debug!(run_id = %run_id, "started tracking run");
        *current = Some(run);
        Ok(run_id)
    }

    fn with_run<T>(&self, f: impl FnOnce(&mut Run) -> T) -> Result<T> {
        let mut current = self.current_run.write();
        let run = current
            .as_mut()
            .ok_or_else(|| PremiumError::InvalidInput("no active run".to_string()))?;
        Ok(f(run))
    }

    /// Log a parameter
    pub fn log_param(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.with_run(|r| {
            r.params.insert(key.into(), value.into());
        })
    }

    /// Log a metric; a later value under the same name replaces it
    pub fn log_metric(&self, name: impl Into<String>, value: f64) -> Result<()> {
        self.with_run(|r| {
            r.metrics.insert(name.into(), value);
        })
    }

    /// Store an artifact blob for the active run
    pub fn log_artifact(&self, name: &str, bytes: &[u8], tags: BTreeMap<String, String>) -> Result<ArtifactEntry> {
        let experiment_id = self
            .current_experiment
            .read()
            .clone()
            .ok_or_else(|| PremiumError::InvalidInput("no experiment selected".to_string()))?;

        let mut current = self.current_run.write();
        let run = current
            .as_mut()
            .ok_or_else(|| PremiumError::InvalidInput("no active run".to_string()))?;

        let prior = {
            let experiments = self.experiments.read();
            experiments
                .iter()
                .find(|e| e.experiment_id == experiment_id)
                .map_or(0, |e| e.artifact_versions(name))
        };
        let in_run = run.artifacts.iter().filter(|a| a.name == name).count() as u32;
        let version = prior + in_run + 1;

        let file_name = format!("{}-v{}.json", name, version);
        let path = self.storage.save_artifact(&experiment_id, &run.run_id, &file_name, bytes)?;
        let entry = ArtifactEntry {
            name: name.to_string(),
            path,
            version,
            tags,
        };
        run.artifacts.push(entry.clone());
        Ok(entry)
    }

    /// Close the active run and append it to the stored log
    pub fn end_run(&self, status: RunStatus) -> Result<Run> {
        let mut run = self
            .current_run
            .write()
            .take()
            .ok_or_else(|| PremiumError::InvalidInput("no active run".to_string()))?;
        run.end_time = Some(Utc::now());
        run.status = status;

        let experiment_id = self.current_experiment.read().clone();
        {
            let mut experiments = self.experiments.write();
            let experiment = experiments
                .iter_mut()
                .find(|e| Some(&e.experiment_id) == experiment_id.as_ref())
                .ok_or_else(|| PremiumError::InvalidInput("no experiment selected".to_string()))?;
            experiment.runs.push(run.clone());
        }
        self.save()?;
        debug!(run_id = %run.run_id, status = ?run.status, "ended tracking run");
        Ok(run)
    }

    /// Get the current experiment
    pub fn current_experiment(&self) -> Option<Experiment> {
        let id = self.current_experiment.read().clone()?;
        self.experiments
            .read()
            .iter()
            .find(|e| e.experiment_id == id)
            .cloned()
    }

    /// List all experiments
    pub fn list_experiments(&self) -> Vec<Experiment> {
        self.experiments.read().clone()
    }

    /// Save current state to storage
    pub fn save(&self) -> Result<()> {
        let experiments = self.experiments.read();
        self.storage.save_experiments(&experiments)
    }
}
