//! Ingestion stage: raw CSV in, cleaned train/test partitions out

use crate::error::{PremiumError, Result};
use crate::pipeline::{ArtifactStore, PipelineConfig};
use crate::preprocessing::{classify_column, ColumnKind, ImputeStrategy, Imputer};
use crate::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

use super::split::{take_rows, TrainTestSplit};
use super::total_nulls;

/// Median/mode fill learned from the training partition
#[derive(Debug, Clone)]
pub struct MissingValueTreatment {
    numeric: Imputer,
    categorical: Imputer,
}

impl MissingValueTreatment {
    /// Learn medians for numeric and modes for string columns, target excluded
    pub fn fit(df: &DataFrame, target_column: &str) -> Result<Self> {
        let mut numeric_cols = Vec::new();
        let mut categorical_cols = Vec::new();
        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == target_column {
                continue;
            }
            match classify_column(name, col.dtype())? {
                ColumnKind::Numeric => numeric_cols.push(name.to_string()),
                ColumnKind::Categorical => categorical_cols.push(name.to_string()),
            }
        }

        let mut numeric = Imputer::new(ImputeStrategy::Median);
        numeric.fit(df, &numeric_cols)?;
        let mut categorical = Imputer::new(ImputeStrategy::MostFrequent);
        categorical.fit(df, &categorical_cols)?;

        Ok(Self { numeric, categorical })
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let filled = self.numeric.transform(df)?;
        self.categorical.transform(&filled)
    }

    pub fn numeric(&self) -> &Imputer {
        &self.numeric
    }

    pub fn categorical(&self) -> &Imputer {
        &self.categorical
    }
}

/// Output of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestionOutput {
    pub train: DataFrame,
    pub test: DataFrame,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

/// Loads the raw dataset, splits it and writes the cleaned CSV artifacts
#[derive(Debug, Clone)]
pub struct DataIngestion {
    raw_data_path: PathBuf,
    store: ArtifactStore,
    target_column: String,
    split: TrainTestSplit,
    loader: DataLoader,
}

impl DataIngestion {
    pub fn new(
        raw_data_path: impl Into<PathBuf>,
        store: ArtifactStore,
        target_column: impl Into<String>,
        split: TrainTestSplit,
    ) -> Self {
        Self {
            raw_data_path: raw_data_path.into(),
            store,
            target_column: target_column.into(),
            split,
            loader: DataLoader::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(
            &config.raw_data_path,
            ArtifactStore::new(&config.artifact_root),
            &config.target_column,
            TrainTestSplit::new(config.test_fraction, config.random_seed)?,
        ))
    }

    /// Run ingestion and persist `data.csv`, `train.csv` and `test.csv`
    pub fn initiate(&self) -> Result<IngestionOutput> {
        info!(path = %self.raw_data_path.display(), "Getting the source data");
        let raw = self.loader.load_csv(&self.raw_data_path)?;
        let df = self.clean_target(raw)?;

        let (train_idx, test_idx) = self.split.indices(df.height())?;
        let train_raw = take_rows(&df, &train_idx)?;

        let treatment = MissingValueTreatment::fit(&train_raw, &self.target_column)?;
        let cleaned = treatment.apply(&df)?;
        info!(
            remaining_nulls = total_nulls(&cleaned),
            "Treated missing values with training medians and modes"
        );

        let train = take_rows(&cleaned, &train_idx)?;
        let test = take_rows(&cleaned, &test_idx)?;

        self.store.ensure_root()?;
        DataSaver::save_csv(&cleaned, self.store.data_path())?;
        DataSaver::save_csv(&train, self.store.train_path())?;
        DataSaver::save_csv(&test, self.store.test_path())?;

        info!(train_rows = train.height(), test_rows = test.height(), "All data files are saved");
        Ok(IngestionOutput {
            train,
            test,
            train_path: self.store.train_path(),
            test_path: self.store.test_path(),
        })
    }

    /// Rows without a target cannot be trained on or scored
    fn clean_target(&self, df: DataFrame) -> Result<DataFrame> {
        if df.height() == 0 {
            return Err(PremiumError::DataError("raw dataset is empty".to_string()));
        }
        let target = df.column(&self.target_column).map_err(|_| {
            PremiumError::DataError(format!("target column '{}' not found", self.target_column))
        })?;

        let missing = target.null_count();
        if missing == 0 {
            return Ok(df);
        }

        warn!(rows = missing, "Dropping rows without a target value");
        let mask = target.is_not_null();
        Ok(df.filter(&mask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const RAW: &str = "age,sex,bmi,children,smoker,region,expenses
19,female,27.9,0,yes,southwest,16884.92
18,male,33.8,1,no,southeast,1725.55
28,male,33.0,3,no,southeast,4449.46
33,male,22.7,0,no,northwest,21984.47
32,male,28.9,0,no,northwest,3866.86
31,female,25.7,0,no,southeast,3756.62
46,female,,1,no,southeast,8240.59
37,female,27.7,3,no,northwest,7281.51
37,male,29.8,2,no,northeast,6406.41
60,,25.8,0,no,northwest,28923.14
";

    fn ingestion(dir: &std::path::Path) -> DataIngestion {
        let raw_path = dir.join("insurance.csv");
        fs::write(&raw_path, RAW).unwrap();
        DataIngestion::new(
            raw_path,
            ArtifactStore::new(dir.join("artifacts")),
            "expenses",
            TrainTestSplit::new(0.2, 42).unwrap(),
        )
    }

    #[test]
    fn test_initiate_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = ingestion(dir.path()).initiate().unwrap();

        assert_eq!(output.train.height(), 8);
        assert_eq!(output.test.height(), 2);
        assert_eq!(total_nulls(&output.train), 0);
        assert_eq!(total_nulls(&output.test), 0);
        assert!(dir.path().join("artifacts/data.csv").exists());
        assert!(output.train_path.exists());
        assert!(output.test_path.exists());
    }

    #[test]
    fn test_missing_target_column() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("raw.csv");
        fs::write(&raw_path, "age,sex\n19,female\n20,male\n").unwrap();

        let ingestion = DataIngestion::new(
            raw_path,
            ArtifactStore::new(dir.path().join("artifacts")),
            "expenses",
            TrainTestSplit::new(0.2, 42).unwrap(),
        );
        assert!(matches!(ingestion.initiate(), Err(PremiumError::DataError(_))));
    }

    #[test]
    fn test_treatment_fills_from_training_statistics() {
        let train = DataFrame::new(vec![
            Column::new("bmi".into(), &[Some(20.0), Some(30.0), Some(24.0)]),
            Column::new("sex".into(), &[Some("male"), Some("female"), Some("male")]),
            Column::new("expenses".into(), &[1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let test = DataFrame::new(vec![
            Column::new("bmi".into(), &[None::<f64>]),
            Column::new("sex".into(), &[None::<&str>]),
            Column::new("expenses".into(), &[4.0]),
        ])
        .unwrap();

        let treatment = MissingValueTreatment::fit(&train, "expenses").unwrap();
        let filled = treatment.apply(&test).unwrap();

        assert_eq!(filled.column("bmi").unwrap().f64().unwrap().get(0), Some(24.0));
        assert_eq!(filled.column("sex").unwrap().str().unwrap().get(0), Some("male"));
    }
}
