// src/store/mod.rs

//! Status store: the durable, ordered list of [`ProcessRecord`]s.
//!
//! - [`file`] backs the store with a JSON list on a [`crate::fs::FileSystem`].
//! - [`memory`] keeps the list in memory for deterministic tests.
//!
//! Access is read-modify-write without locking; exactly one caller is
//! expected to operate on a given store at a time.

pub mod file;
pub mod memory;
pub mod record;

use std::path::Path;

use crate::errors::Result;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;
pub use record::{ProcessRecord, RecordStatus, Transition};

/// Ordered, durable list of process records.
pub trait StatusStore: Send + Sync {
    /// Where the store lives (used for resolving log paths and messages).
    fn location(&self) -> &Path;

    /// Read the current list of records.
    fn load(&self) -> Result<Vec<ProcessRecord>>;

    /// Validate `record`, then re-read, append and rewrite the whole list.
    fn append(&self, record: ProcessRecord) -> Result<()> {
        record.validate()?;
        let mut records = self.load()?;
        records.push(record);
        self.rewrite(&records)
    }

    /// Persist `records` wholesale.
    fn rewrite(&self, records: &[ProcessRecord]) -> Result<()>;
}
