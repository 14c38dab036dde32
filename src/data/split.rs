//! Seeded train/test partition

use crate::error::{PremiumError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row partition of a dataset into training and test sets.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    test_fraction: f64,
    seed: u64,
}

impl TrainTestSplit {
    pub fn new(test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PremiumError::ConfigError(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        Ok(Self { test_fraction, seed })
    }

    /// Number of test rows for a dataset of `n` rows: `ceil(n * fraction)`
    pub fn test_size(&self, n: usize) -> usize {
        (n as f64 * self.test_fraction).ceil() as usize
    }

    /// Shuffled row indices split into `(train, test)`.
    ///
    /// The same seed and row count always yield the same partition.
    pub fn indices(&self, n: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let n_test = self.test_size(n);
        if n < 2 || n_test >= n {
            return Err(PremiumError::DataError(format!(
                "cannot split {} rows with test fraction {}",
                n, self.test_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);
        Ok((train, indices))
    }

    /// Split a frame into `(train, test)` frames
    pub fn split(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let (train_idx, test_idx) = self.indices(df.height())?;
        Ok((take_rows(df, &train_idx)?, take_rows(df, &test_idx)?))
    }
}

pub(crate) fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_disjoint_and_covering() {
        let split = TrainTestSplit::new(0.2, 42).unwrap();
        let (train, test) = split.indices(21).unwrap();

        assert_eq!(test.len(), 5);
        assert_eq!(train.len(), 16);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..21).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = TrainTestSplit::new(0.2, 42).unwrap().indices(50).unwrap();
        let b = TrainTestSplit::new(0.2, 42).unwrap().indices(50).unwrap();
        let c = TrainTestSplit::new(0.2, 7).unwrap().indices(50).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_split_frame() {
        let df = df!(
            "age" => &(0..10i64).collect::<Vec<_>>(),
            "expenses" => &(0..10).map(|v| v as f64 * 10.0).collect::<Vec<_>>()
        )
        .unwrap();

        let (train, test) = TrainTestSplit::new(0.2, 42).unwrap().split(&df).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);
        assert_eq!(train.width(), 2);
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(TrainTestSplit::new(0.0, 1).is_err());
        assert!(TrainTestSplit::new(1.0, 1).is_err());
        assert!(TrainTestSplit::new(0.5, 1).unwrap().indices(1).is_err());
    }
}
