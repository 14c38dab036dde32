//! Storage Backend for Experiment Tracking
//!
//! Provides storage backends for persisting experiments.

use std::fs;
use std::path::PathBuf;

use super::tracker::Experiment;
use crate::error::Result;

/// Storage backend trait
pub trait StorageBackend: Send + Sync {
    /// Save experiments to storage
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()>;

    /// Load experiments from storage
    fn load_experiments(&self) -> Result<Vec<Experiment>>;

    /// Write an artifact blob for a run and return where it landed
    fn save_artifact(&self, experiment_id: &str, run_id: &str, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Local file system storage backend.
///
/// Layout: `<base>/experiments.json` plus
/// `<base>/<experiment_id>/<run_id>/artifacts/<name>` per artifact.
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn experiments_file(&self) -> PathBuf {
        self.base_dir.join("experiments.json")
    }

    fn run_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.base_dir.join(experiment_id).join(run_id)
    }
}

impl StorageBackend for LocalStorage {
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        let json = serde_json::to_string_pretty(experiments)?;
        fs::write(self.experiments_file(), json)?;
        Ok(())
    }

    fn load_experiments(&self) -> Result<Vec<Experiment>> {
        let file_path = self.experiments_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&file_path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_artifact(&self, experiment_id: &str, run_id: &str, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.run_dir(experiment_id, run_id).join("artifacts");
        fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}
