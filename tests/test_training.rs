//! Integration test: Model selection and grid-search tuning

use ndarray::{Array1, Array2};
use premium_automl::error::PremiumError;
use premium_automl::optimizer::{GridConfig, GridSearchCV, HyperparameterTuner};
use premium_automl::training::{
    ModelRegistry, ModelSelector, ParamValue, Regressor, TrainerConfig, ROSTER,
};

/// Rows `start..start + n` of an interleaved 100-row sample, so that every
/// contiguous block spans the whole feature range.
fn dataset(start: usize, n: usize, f: impl Fn(f64, f64) -> f64) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let i = start + i;
        if j == 0 {
            ((i * 37) % 100) as f64
        } else {
            ((i * 11) % 7) as f64
        }
    });
    let y = Array1::from_iter(x.rows().into_iter().map(|row| f(row[0], row[1])));
    (x, y)
}

fn linear(a: f64, b: f64) -> f64 {
    3.0 * a + 2.0 * b + 5.0
}

fn step(a: f64, b: f64) -> f64 {
    if a < 50.0 { 10.0 + b } else { 80.0 + b }
}

#[test]
fn test_selector_scores_full_roster_in_order() {
    let (x_train, y_train) = dataset(0, 80, linear);
    let (x_test, y_test) = dataset(80, 20, linear);

    let selection = ModelSelector::new(42)
        .unwrap()
        .select(&x_train, &y_train, &x_test, &y_test)
        .unwrap();

    let names: Vec<&str> = selection.report.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ROSTER.to_vec());
    assert_eq!(selection.best_name, "LinearRegression");
    assert!(selection.best_score > 0.999);
    assert!(selection.best_model.is_fitted());
}

#[test]
fn test_best_score_is_report_maximum() {
    let (x_train, y_train) = dataset(0, 80, step);
    let (x_test, y_test) = dataset(80, 20, step);

    let selection = ModelSelector::new(7)
        .unwrap()
        .select(&x_train, &y_train, &x_test, &y_test)
        .unwrap();

    let max = selection
        .report
        .iter()
        .map(|(_, score)| score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(selection.best_score, max);
    assert_eq!(selection.report.get(&selection.best_name), Some(max));
    assert_eq!(selection.best_model.name(), selection.best_name);

    // The returned model is the one that produced the reported score
    let rescored = selection.best_model.score(&x_test, &y_test).unwrap();
    assert!((rescored - max).abs() < 1e-12);
}

#[test]
fn test_selector_rejects_mismatched_widths() {
    let (x_train, y_train) = dataset(0, 80, linear);
    let x_test = Array2::<f64>::zeros((5, 3));
    let y_test = Array1::<f64>::zeros(5);
    let err = ModelSelector::new(42)
        .unwrap()
        .select(&x_train, &y_train, &x_test, &y_test)
        .unwrap_err();
    assert!(matches!(err, PremiumError::ShapeError { .. }));
}

#[test]
fn test_grid_search_is_independent_of_thread_count() {
    let (x, y) = dataset(0, 90, step);
    let grid = GridConfig::from_json(
        r#"{"DecisionTreeRegressor": {"max_depth": [1, 2, null], "min_samples_leaf": [1, 5]}}"#,
    )
    .unwrap()
    .grid_for("DecisionTreeRegressor")
    .unwrap()
    .clone();
    let estimator = ModelRegistry::create("DecisionTreeRegressor").unwrap();

    let (_, serial) = GridSearchCV::new(estimator.clone(), grid.clone())
        .with_n_jobs(Some(1))
        .fit(&x, &y)
        .unwrap();
    let (_, parallel) = GridSearchCV::new(estimator, grid)
        .with_n_jobs(Some(4))
        .fit(&x, &y)
        .unwrap();

    assert_eq!(serial.candidates.len(), 6);
    assert_eq!(serial.best_index, parallel.best_index);
    for (a, b) in serial.candidates.iter().zip(&parallel.candidates) {
        assert_eq!(a.params, b.params);
        assert_eq!(a.cv.scores, b.cv.scores);
    }
}

#[test]
fn test_tuner_refits_best_grid_point() {
    let (x_train, y_train) = dataset(0, 80, linear);
    let (x_test, y_test) = dataset(80, 20, linear);
    let grids = GridConfig::from_json(r#"{"DecisionTreeRegressor": {"max_depth": [1, 8]}}"#).unwrap();
    let model = ModelRegistry::create("DecisionTreeRegressor").unwrap();

    let tuner = HyperparameterTuner::new(grids, &TrainerConfig::default().with_n_jobs(2));
    let outcome = tuner
        .tune("DecisionTreeRegressor", &model, &x_train, &y_train, &x_test, &y_test)
        .unwrap();

    assert_eq!(outcome.best_params.get("max_depth"), Some(&ParamValue::Int(8)));
    assert_eq!(outcome.model.params().get("max_depth"), Some(&ParamValue::Int(8)));
    let rescored = outcome.model.score(&x_test, &y_test).unwrap();
    assert!((rescored - outcome.tuned_score).abs() < 1e-12);
}

#[test]
fn test_tuner_requires_grid_for_family() {
    let (x_train, y_train) = dataset(0, 80, linear);
    let (x_test, y_test) = dataset(80, 20, linear);
    let grids = GridConfig::from_json(r#"{"LinearRegression": {"fit_intercept": [true]}}"#).unwrap();
    let model = ModelRegistry::create("AdaBoostRegressor").unwrap();

    let tuner = HyperparameterTuner::new(grids, &TrainerConfig::default());
    let err = tuner
        .tune("AdaBoostRegressor", &model, &x_train, &y_train, &x_test, &y_test)
        .unwrap_err();
    assert!(matches!(err, PremiumError::ConfigError(_)));
}

#[test]
fn test_registry_rejects_unknown_family() {
    assert!(matches!(
        ModelRegistry::create("SupportVectorRegressor"),
        Err(PremiumError::ConfigError(_))
    ));
    for name in ROSTER {
        assert_eq!(ModelRegistry::create(name).unwrap().name(), name);
    }
}
