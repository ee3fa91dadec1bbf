// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::record::{RecordStatus, Transition};

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Entry '{field}' is mandatory.\nProcess entry: {entry}")]
    MissingField { field: &'static str, entry: String },

    #[error("File '{}' already exists!", .0.display())]
    AlreadyExists(PathBuf),

    #[error("File '{}' does not exist!", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed status file '{}': {reason}", .path.display())]
    MalformedStore { path: PathBuf, reason: String },

    #[error("Invalid process record: missing keys {missing:?}")]
    InvalidRecord { missing: Vec<&'static str> },

    #[error("Process '{name}' has stopped with return code {code}")]
    LaunchFailed { name: String, code: i32 },

    #[error("Failed to spawn process '{name}': {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Port {port} of process '{name}' is not open")]
    PortClosed { port: u16, name: String },

    #[error("Invalid status transition {transition:?} from '{from}'")]
    InvalidTransition {
        from: RecordStatus,
        transition: Transition,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
