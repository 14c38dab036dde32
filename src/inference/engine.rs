//! Inference engine implementation
//!
//! Every call reads the persisted transformer/model pair from disk, so a
//! retrained pair is picked up by the next request and nothing is shared
//! between requests.

use std::time::Instant;

use ndarray::Array1;
use polars::prelude::*;
use tracing::{debug, info};

use crate::data::CustomerRecord;
use crate::error::{PremiumError, Result};
use crate::pipeline::ArtifactStore;
use crate::training::Regressor;

/// Predicts premiums from the artifacts of the latest training run
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    store: ArtifactStore,
}

impl InferenceEngine {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// One-element prediction vector for a single customer
    pub fn predict(&self, record: &CustomerRecord) -> Result<Array1<f64>> {
        let frame = record.to_frame()?;
        self.predict_frame(&frame)
    }

    /// Predicted premium for a single customer
    pub fn predict_value(&self, record: &CustomerRecord) -> Result<f64> {
        let predictions = self.predict(record)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| PremiumError::InferenceError("model returned no prediction".to_string()))
    }

    /// Predict every row of a frame laid out like the training data
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let start = Instant::now();
        info!("Loading preprocessor and model files");
        let (transformer, model) = self.store.load_pair()?;

        let features = transformer.transform(df)?;
        let predictions = model.predict(&features)?;
        if predictions.len() != df.height() {
            return Err(PremiumError::InferenceError(format!(
                "expected {} predictions, got {}",
                df.height(),
                predictions.len()
            )));
        }

        debug!(
            rows = df.height(),
            model = model.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "prediction finished"
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let engine = InferenceEngine::new(ArtifactStore::new(dir.path()));
        let record = CustomerRecord::from_fields("19", "female", "27.9", "0", "yes", "southwest").unwrap();
        assert!(engine.predict(&record).is_err());
    }
}
