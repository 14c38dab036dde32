//! Data loading utilities

use crate::error::{PremiumError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// CSV loader for tabular datasets
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer column dtypes
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a CSV file with a header row.
    ///
    /// Empty fields are read as nulls, so missing values survive into the
    /// frame for the missing-value treatment to handle.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PremiumError::DataError(format!("{}: {}", path.display(), e)))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| PremiumError::DataError(format!("{}: {}", path.display(), e)))
    }
}

/// CSV writer counterpart of [`DataLoader`]
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV, creating parent directories and overwriting any existing file
    pub fn save_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)?;
        Self::write_csv(df, &mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Write CSV into any writer (used for byte-level comparisons in tests)
    pub fn write_csv<W: Write>(df: &DataFrame, writer: &mut W) -> Result<()> {
        let mut df = df.clone();
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| PremiumError::DataError(e.to_string()))
    }
}
