//! Regression tree (CART with squared-error splits)

use crate::error::{PremiumError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::models::{check_fit_input, check_predict_input, unknown_param, ParamSet, ParamValue, Regressor};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        }
        .clamp(1, n_features.max(1))
    }

    /// `null` is all features, ints are counts, floats are fractions and
    /// `"sqrt"`/`"log2"` name the heuristics.
    pub fn from_param(name: &str, value: &ParamValue) -> Result<Self> {
        let invalid = |reason: &str| PremiumError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        match value {
            ParamValue::Null => Ok(MaxFeatures::All),
            ParamValue::Int(n) if *n > 0 => Ok(MaxFeatures::Fixed(*n as usize)),
            ParamValue::Float(f) if *f > 0.0 && *f <= 1.0 => Ok(MaxFeatures::Fraction(*f)),
            ParamValue::String(s) => match s.as_str() {
                "sqrt" => Ok(MaxFeatures::Sqrt),
                "log2" => Ok(MaxFeatures::Log2),
                _ => Err(invalid("expected sqrt or log2")),
            },
            _ => Err(invalid("expected null, a positive count, a fraction in (0, 1] or a heuristic name")),
        }
    }

    pub fn to_param(&self) -> ParamValue {
        match *self {
            MaxFeatures::Sqrt => ParamValue::from("sqrt"),
            MaxFeatures::Log2 => ParamValue::from("log2"),
            MaxFeatures::Fraction(f) => ParamValue::Float(f),
            MaxFeatures::Fixed(n) => ParamValue::from(n),
            MaxFeatures::All => ParamValue::Null,
        }
    }
}

/// Best split found for one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Seed for per-node feature sampling
    pub random_state: u64,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: 42,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(PremiumError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(PremiumError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: self.min_samples_leaf.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);

        if should_stop {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        let features = self.candidate_features(rng);
        let Some(best) = self.find_best_split(x, y, indices, &features, mean) else {
            return TreeNode::Leaf { value: mean, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = self.max_features.resolve(self.n_features);
        let mut features: Vec<usize> = (0..self.n_features).collect();
        if k < self.n_features {
            features.shuffle(rng);
            features.truncate(k);
            features.sort_unstable();
        }
        features
    }

    /// Sorted sweep per feature, features scanned in parallel.
    ///
    /// Gain is the reduction in summed squared error; ties keep the lowest
    /// feature index.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        mean: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.min_samples_leaf;

        // centered targets keep the prefix sums well conditioned
        let total_sum: f64 = indices.iter().map(|&i| y[i] - mean).sum();
        let total_sq: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let feature_results: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i] - mean))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;

                for pos in 0..n - 1 {
                    let (value, target) = pairs[pos];
                    left_sum += target;
                    left_sq += target * target;

                    let next_value = pairs[pos + 1].0;
                    if next_value <= value {
                        continue;
                    }
                    let left_count = pos + 1;
                    let right_count = n - left_count;
                    if left_count < min_leaf || right_count < min_leaf {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let left_sse = left_sq - left_sum * left_sum / left_count as f64;
                    let right_sse = right_sq - right_sum * right_sum / right_count as f64;
                    let gain = parent_sse - left_sse - right_sse;

                    if gain > best.map_or(0.0, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (value + next_value) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }

    /// Predict one row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let mut node = self.root.as_ref().ok_or(PremiumError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return Ok(*value),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| (y[i] - first).abs() < 1e-10)
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &'static str {
        "DecisionTreeRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.validate()?;

        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.root.is_none() {
            return Err(PremiumError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        x.rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    fn params(&self) -> ParamSet {
        ParamSet::from([
            ("max_depth".to_string(), ParamValue::from(self.max_depth)),
            ("min_samples_split".to_string(), ParamValue::from(self.min_samples_split)),
            ("min_samples_leaf".to_string(), ParamValue::from(self.min_samples_leaf)),
            ("max_features".to_string(), self.max_features.to_param()),
            ("random_state".to_string(), ParamValue::Int(self.random_state as i64)),
        ])
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "max_depth" => self.max_depth = value.as_opt_usize(name)?,
            "min_samples_split" => self.min_samples_split = value.as_usize(name)?,
            "min_samples_leaf" => self.min_samples_leaf = value.as_usize(name)?,
            "max_features" => self.max_features = MaxFeatures::from_param(name, value)?,
            "random_state" => self.random_state = value.as_usize(name)? as u64,
            _ => return Err(unknown_param(self.name(), name, value)),
        }
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_fits_training_data() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        // an unbounded tree memorises distinct inputs
        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTreeRegressor::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        // one split, two leaves
        assert_eq!(tree.predict(&x).unwrap(), array![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(tree.predict(&array![[1.5, 1.5]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 1.0, 1.0, 9.0, 9.0, 100.0];

        let mut tree = DecisionTreeRegressor::new().with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();

        // only the 3/3 split leaves enough samples on each side
        let predictions = tree.predict(&x).unwrap();
        assert!(predictions.iter().take(3).all(|&p| p == 1.0));
        assert!(predictions.iter().skip(3).all(|&p| (p - 118.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_params_round_trip() {
        let mut tree = DecisionTreeRegressor::new();
        tree.set_param("max_depth", &ParamValue::Int(4)).unwrap();
        tree.set_param("max_features", &ParamValue::from("sqrt")).unwrap();
        assert_eq!(tree.max_depth, Some(4));
        assert_eq!(tree.max_features, MaxFeatures::Sqrt);

        tree.set_param("max_depth", &ParamValue::Null).unwrap();
        assert_eq!(tree.params()["max_depth"], ParamValue::Null);
        assert!(tree.set_param("criterion", &ParamValue::from("mse")).is_err());
    }

    #[test]
    fn test_invalid_min_samples_split() {
        let mut tree = DecisionTreeRegressor::new().with_min_samples_split(1);
        assert!(tree.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(15), 4);
        assert_eq!(MaxFeatures::Fixed(100).resolve(11), 11);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(11), 6);
        assert_eq!(MaxFeatures::All.resolve(11), 11);
    }
}
