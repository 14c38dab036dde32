//! Integration test: Full pipeline (ingest → transform → select → tune → track → persist)

use std::fs;
use std::path::{Path, PathBuf};

use premium_automl::error::PremiumError;
use premium_automl::pipeline::{ArtifactStore, PipelineConfig, PipelineStage, TrainingPipeline};
use premium_automl::tracking::{ExperimentTracker, RunStatus, TrackingConfig};
use premium_automl::training::TrainerConfig;
use premium_automl::utils::LoggingContext;

const REGIONS: [&str; 4] = ["northeast", "northwest", "southeast", "southwest"];

const GRID: &str = r#"{
  "LinearRegression": {"fit_intercept": [true, false]},
  "DecisionTreeRegressor": {"max_depth": [3, null]},
  "RandomForestRegressor": {"n_estimators": [10], "max_depth": [4]},
  "AdaBoostRegressor": {"n_estimators": [10]},
  "GradientBoostingRegressor": {"n_estimators": [50], "max_depth": [2]}
}"#;

/// Noiseless premiums: 1000 + 250·age + 400·bmi + 500·children + 20000·smoker
fn write_dataset(path: &Path, n: usize) {
    let mut csv = String::from("age,sex,bmi,children,smoker,region,expenses\n");
    for i in 0..n {
        let age = 18 + (i * 7) % 47;
        let sex = if i % 2 == 0 { "female" } else { "male" };
        let bmi = 18.0 + ((i * 13) % 40) as f64 * 0.5;
        let children = (i * 3) % 5;
        let smoker = i % 3 == 0;
        let region = REGIONS[(i / 3) % 4];
        let expenses = 1000.0
            + 250.0 * age as f64
            + 400.0 * bmi
            + 500.0 * children as f64
            + if smoker { 20000.0 } else { 0.0 };
        csv.push_str(&format!(
            "{},{},{:.1},{},{},{},{:.2}\n",
            age,
            sex,
            bmi,
            children,
            if smoker { "yes" } else { "no" },
            region,
            expenses
        ));
    }
    fs::write(path, csv).unwrap();
}

fn config(dir: &Path) -> PipelineConfig {
    fs::write(dir.join("model_params.json"), GRID).unwrap();
    write_dataset(&dir.join("insurance.csv"), 60);

    PipelineConfig::new()
        .with_raw_data_path(dir.join("insurance.csv"))
        .with_artifact_root(dir.join("artifacts"))
        .with_log_dir(dir.join("logs"))
        .with_trainer(TrainerConfig::default().with_grid_path(dir.join("model_params.json")))
        .with_tracking(TrackingConfig {
            experiment_root: dir.join("mlruns"),
            ..Default::default()
        })
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = TrainingPipeline::new(config(dir.path()))
        .unwrap()
        .with_logging(LoggingContext::new(dir.path().join("logs")).with_file_name("run.log"));

    let report = pipeline.run_with_report().unwrap();

    assert_eq!(pipeline.stage(), PipelineStage::Done);
    assert_eq!(
        pipeline.history(),
        &[
            PipelineStage::Idle,
            PipelineStage::Ingesting,
            PipelineStage::Transforming,
            PipelineStage::Selecting,
            PipelineStage::Tuning,
            PipelineStage::Tracking,
            PipelineStage::Persisted,
            PipelineStage::Done,
        ]
    );

    assert_eq!(report.model_report.len(), 5);
    assert_eq!(report.best_model, "LinearRegression");
    assert!(report.tuned_score > 0.99, "tuned R² {}", report.tuned_score);
    assert!((report.metrics.r2 - report.tuned_score).abs() < 1e-9);
    assert!(report.best_params.contains_key("fit_intercept"));

    let store = ArtifactStore::new(dir.path().join("artifacts"));
    for path in [store.data_path(), store.train_path(), store.test_path()] {
        assert!(path.exists(), "{} missing", path.display());
    }
    assert_eq!(report.transformer_path, store.transformer_path());
    assert_eq!(report.model_path, store.model_path());
    let (transformer, _) = store.load_pair().unwrap();
    assert_eq!(transformer.n_features_out(), 11);

    let log = fs::read_to_string(&report.log_path).unwrap();
    assert!(log.contains("Pipeline stage"));
    assert!(log.contains("Model training completed successfully"));
}

/// Tuned holdout R² of the 20-row fixture. Its premiums are an exact linear
/// function of the features once the planted gaps are filled, so the
/// reference is a perfect fit.
const FIXTURE_REFERENCE_R2: f64 = 1.0;
const FIXTURE_TOLERANCE: f64 = 1e-6;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn test_fixture_with_missing_values_matches_reference() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new()
        .with_raw_data_path(fixtures().join("insurance_20.csv"))
        .with_artifact_root(dir.path().join("artifacts"))
        .with_log_dir(dir.path().join("logs"))
        .with_trainer(TrainerConfig::default().with_grid_path(fixtures().join("model_params.json")))
        .with_tracking(TrackingConfig {
            experiment_root: dir.path().join("mlruns"),
            ..Default::default()
        });

    let report = TrainingPipeline::new(config).unwrap().run_with_report().unwrap();
    assert_eq!(report.best_model, "LinearRegression");
    assert!(
        (report.tuned_score - FIXTURE_REFERENCE_R2).abs() < FIXTURE_TOLERANCE,
        "tuned R² {} drifted from {}",
        report.tuned_score,
        FIXTURE_REFERENCE_R2
    );

    // Row 5 lacks `sex` (mode: female), row 12 lacks `children` (median: 2)
    let store = ArtifactStore::new(dir.path().join("artifacts"));
    let data = fs::read_to_string(store.data_path()).unwrap();
    let rows: Vec<Vec<&str>> = data.lines().skip(1).map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[5][1], "female");
    assert_eq!(rows[12][3].parse::<f64>().unwrap(), 2.0);
    assert!(rows.iter().all(|row| row.iter().all(|field| !field.is_empty())));

    let train = fs::read_to_string(store.train_path()).unwrap();
    let test = fs::read_to_string(store.test_path()).unwrap();
    assert_eq!(train.lines().count(), 1 + 16);
    assert_eq!(test.lines().count(), 1 + 4);
}

#[test]
fn test_split_sizes_and_reproducibility() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    TrainingPipeline::new(config(first.path())).unwrap().run().unwrap();
    TrainingPipeline::new(config(second.path())).unwrap().run().unwrap();

    let a = ArtifactStore::new(first.path().join("artifacts"));
    let b = ArtifactStore::new(second.path().join("artifacts"));

    let train = fs::read_to_string(a.train_path()).unwrap();
    let test = fs::read_to_string(a.test_path()).unwrap();
    // header + rows; ceil(60 * 0.2) = 12 held out
    assert_eq!(train.lines().count(), 1 + 48);
    assert_eq!(test.lines().count(), 1 + 12);

    assert_eq!(train, fs::read_to_string(b.train_path()).unwrap());
    assert_eq!(test, fs::read_to_string(b.test_path()).unwrap());
}

#[test]
fn test_experiment_log_records_final_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let tracking = config.tracking.clone();

    TrainingPipeline::new(config).unwrap().run().unwrap();

    let tracker = ExperimentTracker::new(&tracking).unwrap();
    let experiments = tracker.list_experiments();
    let experiment = experiments
        .iter()
        .find(|e| e.name == tracking.experiment_name)
        .unwrap();

    assert_eq!(experiment.runs.len(), 1);
    let run = &experiment.runs[0];
    assert_eq!(run.status, RunStatus::Finished);
    assert_eq!(run.run_name, "LinearRegression");
    for metric in ["rmse", "mae", "r2"] {
        assert!(run.metrics.contains_key(metric), "{metric} not logged");
    }
    assert!(run.params.contains_key("fit_intercept"));
    assert_eq!(run.artifacts.len(), 1);
    assert_eq!(run.artifacts[0].name, "model");
    assert!(run.artifacts[0].path.exists());
    assert!(run.artifacts[0].tags.is_empty());
}

#[test]
fn test_missing_grid_fails_in_tuning() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path())
        .with_trainer(TrainerConfig::default().with_grid_path(dir.path().join("absent.json")));

    let mut pipeline = TrainingPipeline::new(config).unwrap();
    let err = pipeline.run().unwrap_err();

    assert!(matches!(
        err,
        PremiumError::Stage {
            stage: PipelineStage::Tuning,
            ..
        }
    ));
    assert!(matches!(err.root_cause(), PremiumError::ConfigError(_)));
    assert_eq!(pipeline.stage(), PipelineStage::Failed);

    // Ingestion output from the earlier stages stays on disk
    assert!(ArtifactStore::new(dir.path().join("artifacts")).train_path().exists());
    assert!(!ArtifactStore::new(dir.path().join("artifacts")).model_path().exists());
}
