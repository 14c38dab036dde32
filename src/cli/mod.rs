//! Premium CLI Module
//!
//! Command-line interface for retraining, quoting a single customer and
//! reviewing stored quotes.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::error;

use crate::data::CustomerRecord;
use crate::inference::{InferenceEngine, RecordStore};
use crate::pipeline::{ArtifactStore, PipelineConfig, TrainingPipeline, TrainingReport};
use crate::utils::LoggingContext;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "premium")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Health-insurance premium training and prediction")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Retrain the model on the configured dataset
    Train {
        /// Pipeline configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Raw dataset (CSV), overrides the configured path
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact directory, overrides the configured path
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Predict the premium for one customer
    Predict {
        #[arg(long)]
        age: String,

        /// male or female
        #[arg(long)]
        sex: String,

        #[arg(long)]
        bmi: String,

        #[arg(long)]
        children: String,

        /// yes or no
        #[arg(long)]
        smoker: String,

        /// northeast, northwest, southeast or southwest
        #[arg(long)]
        region: String,

        /// Append the record and its prediction to the record store
        #[arg(long)]
        save: bool,

        /// Customer name stored alongside a saved record
        #[arg(long, requires = "save")]
        name: Option<String>,

        /// Directory holding the trained artifacts
        #[arg(long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Directory receiving predict.log
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },

    /// List saved predictions
    Records {
        /// Directory holding the record store
        #[arg(long, default_value = "artifacts")]
        artifacts: PathBuf,
    },
}

/// Raw form fields of the `predict` command
pub struct PredictArgs<'a> {
    pub age: &'a str,
    pub sex: &'a str,
    pub bmi: &'a str,
    pub children: &'a str,
    pub smoker: &'a str,
    pub region: &'a str,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    config_path: Option<&Path>,
    data_path: Option<&Path>,
    artifacts: Option<&Path>,
) -> anyhow::Result<TrainingReport> {
    section("Train");

    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = data_path {
        config = config.with_raw_data_path(path);
    }
    if let Some(path) = artifacts {
        config = config.with_artifact_root(path);
    }

    step_run(&format!("Training on {}", config.raw_data_path.display().to_string().cyan()));
    let start = Instant::now();
    let mut pipeline = TrainingPipeline::new(config)?;
    let report = pipeline.run_with_report()?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    println!("  {:<28} {:>10}", muted("Model"), muted("R²"));
    println!("  {}", dim(&"─".repeat(40)));
    for (name, score) in report.model_report.iter() {
        println!("  {:<28} {:>10.4}", name, score);
    }
    println!("  {}", dim(&"─".repeat(40)));

    println!();
    kv("Best model", &report.best_model);
    kv("Untuned R²", &format!("{:.4}", report.untuned_score));
    for (param, value) in &report.best_params {
        kv(&format!("  {}", param), &value.to_string());
    }
    kv("RMSE", &format!("{:.2}", report.metrics.rmse));
    kv("MAE", &format!("{:.2}", report.metrics.mae));
    println!(
        "  {:<18} {}",
        muted("Tuned R²"),
        format!("{:.4}", report.tuned_score).white().bold()
    );
    println!(
        "  {:<18} {}",
        muted("Accuracy"),
        format!("{:.2}%", report.tuned_score * 100.0).white().bold()
    );
    kv("Artifacts", &report.model_path.display().to_string());
    kv("Log", &report.log_path.display().to_string());
    println!();

    Ok(report)
}

/// Predict one premium. Failures print a short message and return an
/// error; the underlying cause only goes to `<log_dir>/predict.log`.
pub fn cmd_predict(
    fields: &PredictArgs<'_>,
    save: bool,
    name: Option<&str>,
    artifacts: &Path,
    log_dir: &Path,
) -> anyhow::Result<f64> {
    let _log = LoggingContext::new(log_dir).with_file_name("predict.log").install()?;

    let record = match CustomerRecord::from_fields(
        fields.age,
        fields.sex,
        fields.bmi,
        fields.children,
        fields.smoker,
        fields.region,
    ) {
        Ok(record) => record,
        Err(e) => {
            println!("  {} {}", "invalid input:".red(), e);
            anyhow::bail!("invalid input");
        }
    };

    let store = ArtifactStore::new(artifacts);
    let engine = InferenceEngine::new(store.clone());
    let premium = match engine.predict_value(&record) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, root_cause = %e.root_cause(), "Prediction failed");
            println!("  {}", "prediction failed".red());
            anyhow::bail!("prediction failed");
        }
    };

    println!("Predicted Insurance Amount: {:.2}", premium);

    if save {
        let records = RecordStore::new(store.records_path());
        let saved = records.append(name, &record, premium)?;
        println!("  {} {}", ok("saved"), dim(&saved.id));
    }

    Ok(premium)
}

pub fn cmd_records(artifacts: &Path) -> anyhow::Result<usize> {
    section("Records");

    let store = RecordStore::new(ArtifactStore::new(artifacts).records_path());
    let records = store.list()?;
    if records.is_empty() {
        println!("  {}", muted("no saved records"));
        println!();
        return Ok(0);
    }

    println!(
        "  {:<16} {:>4} {:<7} {:>6} {:>3} {:<6} {:<10} {:>12}  {}",
        muted("Name"),
        muted("Age"),
        muted("Sex"),
        muted("BMI"),
        muted("Ch"),
        muted("Smoker"),
        muted("Region"),
        muted("Expenses"),
        muted("Created"),
    );
    println!("  {}", dim(&"─".repeat(90)));
    for entry in &records {
        let r = &entry.record;
        println!(
            "  {:<16} {:>4} {:<7} {:>6.1} {:>3} {:<6} {:<10} {:>12.2}  {}",
            entry.name.as_deref().unwrap_or("-"),
            r.age,
            r.sex,
            r.bmi,
            r.children,
            r.smoker,
            r.region,
            entry.expenses,
            dim(&entry.created_at.format("%Y-%m-%d %H:%M").to_string()),
        );
    }
    println!();

    Ok(records.len())
}
