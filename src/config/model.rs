// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration as read from disk, before validation.
///
/// Mirrors documents like:
///
/// ```json
/// {
///     "backend_processes_data_file": "backend_processes.json",
///     "backend_processes": [
///         {
///             "name": "openocd",
///             "path": "/usr/bin/openocd",
///             "port": 3333,
///             "search_string": "openocd",
///             "arguments": ["-f", "board.cfg"],
///             "log_file": "openocd.log"
///         }
///     ]
/// }
/// ```
///
/// Every field is optional here so that validation can name exactly which
/// one is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub backend_processes_data_file: Option<String>,

    #[serde(default)]
    pub backend_processes: Vec<RawProcessSpec>,
}

/// One entry of `backend_processes` as written by the user.
///
/// `Serialize` is only used to echo an offending entry back in validation
/// errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawProcessSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub search_string: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub log_file: Option<String>,
}

/// A validated process specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Unique, human-readable key.
    pub name: String,
    /// Executable to launch.
    pub path: String,
    /// TCP port the process is expected to listen on.
    pub port: u16,
    /// Secondary liveness token. Persisted but not probed.
    pub search_string: String,
    pub arguments: Vec<String>,
    /// Log file, relative to the status file's directory.
    pub log_file: String,
}

impl ProcessSpec {
    /// The full command line: executable followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.path.clone())
            .chain(self.arguments.iter().cloned())
            .collect()
    }

    /// Command line joined with single spaces, as stored in `process_call`.
    pub fn process_call(&self) -> String {
        self.command_line().join(" ")
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`crate::config::loader::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Directory the configuration was loaded from; relative paths resolve
    /// against it.
    pub base_dir: PathBuf,

    /// File name (or relative path) of the status store.
    pub data_file: String,

    /// Process specifications in declaration order.
    pub processes: Vec<ProcessSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(data_file: String, processes: Vec<ProcessSpec>) -> Self {
        Self {
            base_dir: PathBuf::from("."),
            data_file,
            processes,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Resolve the status file location.
    ///
    /// With an override directory the data file name is joined onto it,
    /// otherwise onto the configuration's own directory.
    pub fn status_file_path(&self, base_override: Option<&Path>) -> PathBuf {
        match base_override {
            Some(dir) => dir.join(&self.data_file),
            None => self.base_dir.join(&self.data_file),
        }
    }
}
