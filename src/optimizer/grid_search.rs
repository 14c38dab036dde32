//! Exhaustive cross-validated grid search

use std::time::Instant;

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::grid::{expand_grid, ParamGrid};
use crate::error::{PremiumError, Result};
use crate::training::{CVResults, KFold, ParamSet, Regressor, RegressorModel};

/// Cross-validated score of one grid point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub cv: CVResults,
}

/// Every evaluated grid point, in expansion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResults {
    pub candidates: Vec<CandidateResult>,
    pub best_index: usize,
    pub total_duration_secs: f64,
}

impl GridSearchResults {
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[self.best_index]
    }

    pub fn best_params(&self) -> &ParamSet {
        &self.best().params
    }

    /// Mean validation R² of the winning grid point
    pub fn best_score(&self) -> f64 {
        self.best().cv.mean_score
    }
}

/// Grid search over one estimator's hyperparameters.
///
/// Every (candidate, fold) pair is evaluated on a dedicated thread pool that
/// lives only for the duration of [`GridSearchCV::fit`]. Jobs run under the
/// caller's tracing dispatcher, so their events land in the caller's run log.
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    estimator: RegressorModel,
    grid: ParamGrid,
    cv_folds: usize,
    n_jobs: Option<usize>,
}

impl GridSearchCV {
    pub fn new(estimator: RegressorModel, grid: ParamGrid) -> Self {
        Self {
            estimator,
            grid,
            cv_folds: 3,
            n_jobs: None,
        }
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    fn candidate_model(&self, params: &ParamSet) -> Result<RegressorModel> {
        let mut model = self.estimator.fresh()?;
        model.set_params(params)?;
        Ok(model)
    }

    /// Score every grid point and refit the winner on all of `(x, y)`
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(RegressorModel, GridSearchResults)> {
        let start = Instant::now();
        if x.nrows() != y.len() {
            return Err(PremiumError::ShapeError {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }

        let candidates = expand_grid(&self.grid);
        // reject bad names or types before any fitting starts
        for params in &candidates {
            self.candidate_model(params)?;
        }

        let splits = KFold::new(self.cv_folds).split(x.nrows())?;
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        info!(
            model = self.estimator.name(),
            n_candidates = candidates.len(),
            n_folds = splits.len(),
            "starting grid search"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_jobs.unwrap_or(0))
            .build()
            .map_err(|e| PremiumError::OptimizationError(format!("Thread pool error: {}", e)))?;

        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let fold_scores = pool.install(|| {
            jobs.par_iter()
                .map(|&(c, f)| -> Result<f64> {
                    tracing::dispatcher::with_default(&dispatch, || -> Result<f64> {
                        let split = &splits[f];
                        let mut model = self.candidate_model(&candidates[c])?;
                        model.fit(
                            &x.select(Axis(0), &split.train_indices),
                            &y.select(Axis(0), &split.train_indices),
                        )?;
                        let score = model.score(
                            &x.select(Axis(0), &split.test_indices),
                            &y.select(Axis(0), &split.test_indices),
                        )?;
                        debug!(candidate = c, fold = f, r2 = score, "fold scored");
                        Ok(score)
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })?;

        let results: Vec<CandidateResult> = candidates
            .into_iter()
            .zip(fold_scores.chunks(splits.len()))
            .map(|(params, scores)| CandidateResult {
                params,
                cv: CVResults::from_scores(scores.to_vec()),
            })
            .collect();

        let mut best_index: Option<usize> = None;
        for (i, candidate) in results.iter().enumerate() {
            let mean = candidate.cv.mean_score;
            debug!(params = ?candidate.params, mean_r2 = mean, "grid point scored");
            if mean.is_nan() {
                continue;
            }
            match best_index {
                Some(b) if !(mean > results[b].cv.mean_score) => {}
                _ => best_index = Some(i),
            }
        }
        let best_index = best_index.ok_or_else(|| {
            PremiumError::OptimizationError("every grid point produced a NaN score".to_string())
        })?;

        let mut best_model = self.candidate_model(&results[best_index].params)?;
        best_model.fit(x, y)?;

        let results = GridSearchResults {
            candidates: results,
            best_index,
            total_duration_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            model = self.estimator.name(),
            best_params = ?results.best_params(),
            mean_r2 = results.best_score(),
            "grid search finished"
        );
        Ok((best_model, results))
    }
}
