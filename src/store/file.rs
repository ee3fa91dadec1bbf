// src/store/file.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{FleetError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::{ProcessRecord, StatusStore};

/// Status store persisted as a JSON list.
///
/// The file, once created, always holds a syntactically valid list.
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileStatusStore {
    /// Create an empty store at `path`.
    ///
    /// Fails with [`FleetError::AlreadyExists`] when a file is already there
    /// and `overwrite` is false; with `overwrite` the file is replaced by an
    /// empty list.
    pub fn create(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        let path = path.into();
        if fs.exists(&path) && !overwrite {
            return Err(FleetError::AlreadyExists(path));
        }

        let store = Self { fs, path };
        store.rewrite(&[])?;
        info!(path = %store.path.display(), overwrite, "created status file");
        Ok(store)
    }

    /// Open an existing store. Its content is checked on every `load`.
    pub fn open(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !fs.is_file(&path) {
            return Err(FleetError::NotFound(path));
        }
        debug!(path = %path.display(), "opened status file");
        Ok(Self { fs, path })
    }

    /// [`FileStatusStore::create`] on the real filesystem.
    pub fn create_on_disk(path: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        Self::create(Arc::new(RealFileSystem), path, overwrite)
    }

    /// [`FileStatusStore::open`] on the real filesystem.
    pub fn open_on_disk(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(Arc::new(RealFileSystem), path)
    }

    fn malformed(&self, reason: impl Into<String>) -> FleetError {
        FleetError::MalformedStore {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl StatusStore for FileStatusStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ProcessRecord>> {
        if !self.fs.is_file(&self.path) {
            return Err(FleetError::NotFound(self.path.clone()));
        }
        let contents = self.fs.read_to_string(&self.path)?;

        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| self.malformed(e.to_string()))?;
        if !value.is_array() {
            return Err(self.malformed("expected a list at the top level"));
        }

        serde_json::from_value(value).map_err(|e| self.malformed(e.to_string()))
    }

    fn rewrite(&self, records: &[ProcessRecord]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        self.fs.write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), records = records.len(), "status file written");
        Ok(())
    }
}
