//! Per-run logging context
//!
//! Each training run writes its own log file. The file subscriber is
//! installed as the thread default for as long as the returned guard lives,
//! so two runs in one process never share a log and tests can capture a
//! run's output in isolation. Thread-pool work that logs (the grid search)
//! re-enters the current dispatcher on its worker threads.

use crate::error::Result;
use chrono::Local;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// File-backed log destination scoped to one pipeline run
#[derive(Debug, Clone)]
pub struct LoggingContext {
    log_dir: PathBuf,
    file_name: String,
    filter: String,
}

/// Keeps the run's subscriber installed until dropped
pub struct RunLogGuard {
    _guard: DefaultGuard,
    path: PathBuf,
}

impl RunLogGuard {
    /// Path of the log file receiving this run's records
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LoggingContext {
    /// Create a context whose file name is stamped with the current local time
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_name: format!("{}.log", Local::now().format("%d-%b-%Y_%H-%M-%S")),
            filter: "info".to_string(),
        }
    }

    /// Override the file name (mainly for tests)
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Override the level filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Full path of the log file
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }

    /// Open the log file and install it as the current thread's subscriber.
    pub fn install(&self) -> Result<RunLogGuard> {
        fs::create_dir_all(&self.log_dir)?;
        let path = self.log_path();
        let file = File::options().create(true).append(true).open(&path)?;

        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_env_filter(EnvFilter::new(&self.filter))
            .finish();

        Ok(RunLogGuard {
            _guard: tracing::subscriber::set_default(subscriber),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoggingContext::new(dir.path()).with_file_name("run.log");

        {
            let guard = ctx.install().unwrap();
            tracing::info!(stage = "Ingesting", "starting stage");
            assert_eq!(guard.path(), dir.path().join("run.log"));
        }
        tracing::info!("outside the run");

        let contents = fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(contents.contains("starting stage"));
        assert!(contents.contains("INFO"));
        assert!(!contents.contains("outside the run"));
    }

    #[test]
    fn test_default_file_name_is_timestamped() {
        let ctx = LoggingContext::new("logs");
        let name = ctx.log_path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".log"));
        assert_eq!(name.matches('_').count(), 1);
    }
}
