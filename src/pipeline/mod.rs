//! Training pipeline: configuration, artifact persistence and the stage
//! state machine that sequences ingestion through persistence

mod artifacts;
mod config;
mod orchestrator;

pub use artifacts::{Artifact, ArtifactStore};
pub use config::PipelineConfig;
pub use orchestrator::{TrainingPipeline, TrainingReport};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stages of one training run, in execution order.
///
/// `Failed` is terminal and reachable from any stage before `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Idle,
    Ingesting,
    Transforming,
    Selecting,
    Tuning,
    Tracking,
    Persisted,
    Done,
    Failed,
}

impl PipelineStage {
    /// Stage following `self` on success
    pub fn next(self) -> Option<PipelineStage> {
        use PipelineStage::*;
        match self {
            Idle => Some(Ingesting),
            Ingesting => Some(Transforming),
            Transforming => Some(Selecting),
            Selecting => Some(Tuning),
            Tuning => Some(Tracking),
            Tracking => Some(Persisted),
            Persisted => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Ingesting => "Ingesting",
            PipelineStage::Transforming => "Transforming",
            PipelineStage::Selecting => "Selecting",
            PipelineStage::Tuning => "Tuning",
            PipelineStage::Tracking => "Tracking",
            PipelineStage::Persisted => "Persisted",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_sequence() {
        let mut stage = PipelineStage::Idle;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited.len(), 8);
        assert_eq!(stage, PipelineStage::Done);
        assert!(stage.is_terminal());
        assert_eq!(PipelineStage::Failed.next(), None);
    }
}
