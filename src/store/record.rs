// src/store/record.rs

//! Persisted process records and their status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ProcessSpec;
use crate::errors::{FleetError, Result};

/// Lifecycle status of a launched process.
///
/// The serialized names are the strings found in status files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "terminate requested")]
    TerminateRequested,
    #[serde(rename = "terminated")]
    Terminated,
    #[serde(rename = "SIGKILL requested")]
    KillRequested,
    #[serde(rename = "killed")]
    Killed,
    #[serde(rename = "SIGKILL FAILED", alias = "SIGKILL failed")]
    KillFailed,
}

/// Events that move a record between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Graceful signal delivered.
    GracefulSent,
    /// PID no longer resolves (or is a zombie).
    ConfirmedGone,
    /// Still alive after the graceful signal; forceful signal sent.
    KillSent,
    /// Gone after the forceful signal.
    KillConfirmed,
    /// Still alive after the forceful signal.
    KillFailed,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 6] = [
        RecordStatus::Running,
        RecordStatus::TerminateRequested,
        RecordStatus::Terminated,
        RecordStatus::KillRequested,
        RecordStatus::Killed,
        RecordStatus::KillFailed,
    ];

    /// Apply a transition, rejecting edges the lifecycle does not have.
    pub fn apply(self, transition: Transition) -> Result<RecordStatus> {
        let next = match (self, transition) {
            (RecordStatus::Running, Transition::GracefulSent) => RecordStatus::TerminateRequested,
            (
                RecordStatus::Running | RecordStatus::TerminateRequested,
                Transition::ConfirmedGone,
            ) => RecordStatus::Terminated,
            (RecordStatus::TerminateRequested, Transition::KillSent) => {
                RecordStatus::KillRequested
            }
            (RecordStatus::KillRequested, Transition::KillConfirmed) => RecordStatus::Killed,
            (RecordStatus::KillRequested, Transition::KillFailed) => RecordStatus::KillFailed,
            (from, transition) => {
                return Err(FleetError::InvalidTransition { from, transition });
            }
        };
        Ok(next)
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RecordStatus::Terminated | RecordStatus::Killed | RecordStatus::KillFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Running => "running",
            RecordStatus::TerminateRequested => "terminate requested",
            RecordStatus::Terminated => "terminated",
            RecordStatus::KillRequested => "SIGKILL requested",
            RecordStatus::Killed => "killed",
            RecordStatus::KillFailed => "SIGKILL FAILED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime state of one launched process, as persisted in the status store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    #[serde(with = "pid_string")]
    pub pid: u32,
    pub log_file: String,
    pub process_call: String,
    pub start_time: String,
    pub port: u16,
    pub search_string: String,
    pub status: RecordStatus,
    #[serde(rename = "SIGTERM_time", default, skip_serializing_if = "Option::is_none")]
    pub sigterm_time: Option<String>,
    #[serde(rename = "SIGKILL_time", default, skip_serializing_if = "Option::is_none")]
    pub sigkill_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProcessRecord {
    /// Build the record for a freshly spawned process.
    pub fn running(spec: &ProcessSpec, pid: u32) -> Self {
        Self {
            name: spec.name.clone(),
            pid,
            log_file: spec.log_file.clone(),
            process_call: spec.process_call(),
            start_time: timestamp(),
            port: spec.port,
            search_string: spec.search_string.clone(),
            status: RecordStatus::Running,
            sigterm_time: None,
            sigkill_time: None,
            note: None,
        }
    }

    /// Move to the next status, or fail without touching the record.
    pub fn transition(&mut self, transition: Transition) -> Result<RecordStatus> {
        self.status = self.status.apply(transition)?;
        Ok(self.status)
    }

    /// Check the minimal-field contract required before a record is stored.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.pid == 0 {
            missing.push("pid");
        }
        if self.process_call.is_empty() {
            missing.push("process_call");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FleetError::InvalidRecord { missing })
        }
    }
}

/// Local wall-clock time as `HH:MM:SS.mmm`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// PIDs are stored as decimal strings.
mod pid_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pid: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pid.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid pid '{raw}'")))
    }
}
