//! Append-only store of served predictions

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::CustomerRecord;
use crate::error::{PremiumError, Result};

/// One submitted record together with the premium it was quoted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub record: CustomerRecord,
    pub expenses: f64,
    pub created_at: DateTime<Utc>,
}

/// JSON-lines file, one [`StoredRecord`] per line
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, name: Option<&str>, record: &CustomerRecord, expenses: f64) -> Result<StoredRecord> {
        let entry = StoredRecord {
            id: Uuid::new_v4().to_string(),
            name: name.map(str::to_string),
            record: record.clone(),
            expenses,
            created_at: Utc::now(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(entry)
    }

    /// All stored records, oldest first; a missing file means none
    pub fn list(&self) -> Result<Vec<StoredRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                PremiumError::SerializationError(format!("{} line {}: {}", self.path.display(), i + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
