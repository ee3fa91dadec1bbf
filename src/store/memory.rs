// src/store/memory.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::Result;
use crate::store::{ProcessRecord, StatusStore};

/// Status store that never touches disk.
///
/// Clones share the same list, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone)]
pub struct MemoryStatusStore {
    location: PathBuf,
    records: Arc<Mutex<Vec<ProcessRecord>>>,
    rewrites: Arc<Mutex<usize>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<ProcessRecord>) -> Self {
        Self {
            location: PathBuf::from("memory/processes.json"),
            records: Arc::new(Mutex::new(records)),
            rewrites: Arc::new(Mutex::new(0)),
        }
    }

    /// Pretend to live at `location`; only affects log path resolution.
    pub fn at(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = location.into();
        self
    }

    pub fn snapshot(&self) -> Vec<ProcessRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of wholesale rewrites performed (appends included).
    pub fn rewrite_count(&self) -> usize {
        *self.rewrites.lock().unwrap()
    }
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for MemoryStatusStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn load(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.snapshot())
    }

    fn rewrite(&self, records: &[ProcessRecord]) -> Result<()> {
        *self.records.lock().unwrap() = records.to_vec();
        *self.rewrites.lock().unwrap() += 1;
        Ok(())
    }
}
