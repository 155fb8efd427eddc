//! JSON-file-backed settings store.
//!
//! Settings are a flat map of strings, staged in memory by `set` and flushed
//! to disk by `save`.
//!
//! # Atomic Writes
//!
//! Saves use the write-to-temp-then-rename pattern:
//! 1. Write to `<path>.tmp`
//! 2. fsync the file
//! 3. Rename to `<path>`
//! 4. fsync the directory
//!
//! A reader therefore sees either the previous settings or the new ones,
//! never a partial file.

use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use super::fsync::{fsync_dir, fsync_file};
use crate::effects::SettingsStore;

/// Errors that can occur when loading or saving settings.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for settings store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Settings persisted as a JSON object of strings.
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonFileSettings {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = values.len(), "settings loaded");
        Ok(JsonFileSettings { path, values })
    }

    fn write_atomic(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Sorted so that the file diffs cleanly between saves.
        let sorted: BTreeMap<_, _> = self.values.iter().collect();
        let bytes = serde_json::to_vec_pretty(&sorted)?;
        let tmp_path = self.path.with_extension("json.tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            fsync_file(&file)?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fsync_dir(parent)?;
        }
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    type Error = StoreError;

    fn get_all(&self) -> HashMap<String, String> {
        self.values.clone()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    async fn save(&mut self) -> Result<()> {
        self.write_atomic()?;
        debug!(path = %self.path.display(), count = self.values.len(), "settings saved");
        Ok(())
    }
}
