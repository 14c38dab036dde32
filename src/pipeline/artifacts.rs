//! Fixed-path artifact store
//!
//! Every training run overwrites the same files under one root directory.
//! The transformer and the model are wrapped in an [`Artifact`] envelope
//! carrying the run id, and are only ever loaded back as a pair from the
//! same run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PremiumError, Result};
use crate::preprocessing::FeatureTransformer;
use crate::training::RegressorModel;

const DATA_FILE: &str = "data.csv";
const TRAIN_FILE: &str = "train.csv";
const TEST_FILE: &str = "test.csv";
const TRANSFORMER_FILE: &str = "preprocessor.json";
const MODEL_FILE: &str = "model.json";
const RECORDS_FILE: &str = "records.jsonl";

/// A persisted object stamped with the run that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact<T> {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

/// Resolves and reads/writes the files under the artifact root
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Whole cleaned dataset
    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    pub fn train_path(&self) -> PathBuf {
        self.root.join(TRAIN_FILE)
    }

    pub fn test_path(&self) -> PathBuf {
        self.root.join(TEST_FILE)
    }

    pub fn transformer_path(&self) -> PathBuf {
        self.root.join(TRANSFORMER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(MODEL_FILE)
    }

    /// Append-only log of served predictions
    pub fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILE)
    }

    pub fn save_transformer(&self, transformer: &FeatureTransformer, run_id: &str) -> Result<PathBuf> {
        let path = self.transformer_path();
        self.write(&path, transformer, run_id)?;
        Ok(path)
    }

    pub fn save_model(&self, model: &RegressorModel, run_id: &str) -> Result<PathBuf> {
        let path = self.model_path();
        self.write(&path, model, run_id)?;
        Ok(path)
    }

    pub fn load_transformer(&self) -> Result<Artifact<FeatureTransformer>> {
        Self::read(&self.transformer_path())
    }

    pub fn load_model(&self) -> Result<Artifact<RegressorModel>> {
        Self::read(&self.model_path())
    }

    /// Load transformer and model, refusing a pair from different runs
    pub fn load_pair(&self) -> Result<(FeatureTransformer, RegressorModel)> {
        let transformer = self.load_transformer()?;
        let model = self.load_model()?;
        if transformer.run_id != model.run_id {
            return Err(PremiumError::ArtifactMismatch {
                transformer_run: transformer.run_id,
                model_run: model.run_id,
            });
        }
        Ok((transformer.payload, model.payload))
    }

    fn write<T: Serialize>(&self, path: &Path, payload: &T, run_id: &str) -> Result<()> {
        self.ensure_root()?;
        let artifact = Artifact {
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            payload,
        };
        let json = serde_json::to_string(&artifact)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), run_id, "artifact written");
        Ok(())
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<Artifact<T>> {
        let json = fs::read_to_string(path)
            .map_err(|e| PremiumError::DataError(format!("cannot read artifact {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| PremiumError::DataError(format!("unreadable artifact {}: {}", path.display(), e)))
    }
}
