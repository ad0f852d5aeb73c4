//! Durable snapshot of tenant configs behind the store.
//!
//! The store itself is in-memory; a [`SnapshotStore`] receives the export after
//! every successful mutation and supplies the initial import at startup.

use std::fs;
use std::path::{Path, PathBuf};

use relaygate_types::models::ExportData;

use crate::error::{AppError, AppResult};

pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> AppResult<Option<ExportData>>;

    fn save(&self, data: &ExportData) -> AppResult<()>;
}

/// JSON file written atomically (temp file + rename).
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshot {
    fn load(&self) -> AppResult<Option<ExportData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AppError::internal("failed to read config snapshot")
                .with_detail("path", self.path.display().to_string())
                .with_cause(e)
        })?;
        let data = serde_json::from_str(&content).map_err(|e| {
            AppError::internal("config snapshot is corrupt")
                .with_detail("path", self.path.display().to_string())
                .with_cause(e)
        })?;
        Ok(Some(data))
    }

    fn save(&self, data: &ExportData) -> AppResult<()> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let temp_path = self.path.with_extension("tmp");
            let content = serde_json::to_vec_pretty(data)?;
            fs::write(&temp_path, content)?;
            fs::rename(&temp_path, &self.path)
        };
        write().map_err(|e| {
            AppError::internal("failed to write config snapshot")
                .with_detail("path", self.path.display().to_string())
                .with_cause(e)
        })
    }
}
