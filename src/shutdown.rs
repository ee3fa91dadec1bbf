// src/shutdown.rs

//! Termination orchestration.
//!
//! Walks the records of a status store one at a time and drives each through
//! `running -> terminate requested -> terminated`, escalating to a forceful
//! signal when the graceful one is ignored:
//!
//! ```text
//! running --SIGTERM--> terminate requested --gone--> terminated
//!                              |
//!                          still alive
//!                              v
//!                      SIGKILL requested --gone--> killed
//!                              |
//!                          still alive
//!                              v
//!                        SIGKILL FAILED
//! ```
//!
//! The full list is persisted after every top-level operation. Records left
//! in `SIGKILL requested` by an interrupted run are picked up again.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::probe::{PidState, ProcessControl, SignalOutcome};
use crate::store::record::timestamp;
use crate::store::{ProcessRecord, RecordStatus, StatusStore, Transition};

const ZOMBIE_NOTE: &str = "zombie: exited, awaiting reap by its parent";

/// Outcome of a shutdown pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub statuses: BTreeMap<String, usize>,
    /// Names of records that ended in `SIGKILL FAILED`.
    pub kill_failed: Vec<String>,
    /// Records a signal could not be sent to, with the error.
    pub signal_errors: Vec<(String, String)>,
    /// Records still alive at verification that were never signalled.
    pub left_running: Vec<String>,
}

impl ShutdownReport {
    fn from_records(records: &[ProcessRecord]) -> Self {
        let mut report = ShutdownReport::default();
        for record in records {
            *report
                .statuses
                .entry(record.status.to_string())
                .or_default() += 1;
            if record.status == RecordStatus::KillFailed {
                report.kill_failed.push(record.name.clone());
            }
        }
        report
    }

    pub fn count(&self, status: RecordStatus) -> usize {
        self.statuses.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn all_stopped(&self) -> bool {
        self.kill_failed.is_empty() && self.signal_errors.is_empty() && self.left_running.is_empty()
    }

    /// One human-readable line per record that did not stop cleanly.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .kill_failed
            .iter()
            .map(|name| format!("SIGKILL failed for '{name}'"))
            .collect();
        problems.extend(
            self.signal_errors
                .iter()
                .map(|(name, err)| format!("could not signal '{name}': {err}")),
        );
        problems.extend(
            self.left_running
                .iter()
                .map(|name| format!("'{name}' is still running and was never signalled")),
        );
        problems
    }
}

/// Drives graceful and forceful shutdown of the records in a store.
///
/// A failure on one record is logged and remembered; the batch always runs
/// over the full list.
pub struct Orchestrator<'a> {
    store: &'a dyn StatusStore,
    control: &'a dyn ProcessControl,
    records: Vec<ProcessRecord>,
    signal_errors: Vec<(String, String)>,
}

/// How a record came out of verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verified {
    Settled,
    LeftRunning,
}

impl<'a> Orchestrator<'a> {
    /// Load the current records from `store`.
    pub fn load(store: &'a dyn StatusStore, control: &'a dyn ProcessControl) -> Result<Self> {
        let records = store.load()?;
        info!(
            store = %store.location().display(),
            records = records.len(),
            "loaded process records"
        );
        Ok(Self {
            store,
            control,
            records,
            signal_errors: Vec::new(),
        })
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Signalling failures seen so far, as `(name, error)`.
    pub fn signal_errors(&self) -> &[(String, String)] {
        &self.signal_errors
    }

    /// Send the graceful stop signal to every running record.
    ///
    /// Only a failure to persist the store is returned as an error.
    pub fn close_applications(&mut self) -> Result<()> {
        for record in self.records.iter_mut() {
            if let Err(e) = close_one(record, self.control) {
                error!(name = %record.name, pid = record.pid, error = %e, "could not send SIGTERM");
                self.signal_errors.push((record.name.clone(), e.to_string()));
            }
        }
        self.store.rewrite(&self.records)
    }

    /// Re-probe every record after the caller's settling wait and escalate
    /// where the graceful signal was ignored.
    ///
    /// `kill_delay` is waited after each forceful signal before the final
    /// probe. Only a failure to persist the store is returned as an error;
    /// everything else ends up in the report.
    pub async fn verify_termination(&mut self, kill_delay: Duration) -> Result<ShutdownReport> {
        let mut left_running = Vec::new();
        for record in self.records.iter_mut() {
            match verify_one(record, self.control, kill_delay).await {
                Ok(Verified::Settled) => {}
                Ok(Verified::LeftRunning) => left_running.push(record.name.clone()),
                Err(e) => {
                    error!(name = %record.name, pid = record.pid, error = %e, "could not verify termination");
                    self.signal_errors.push((record.name.clone(), e.to_string()));
                }
            }
        }
        self.store.rewrite(&self.records)?;

        let mut report = ShutdownReport::from_records(&self.records);
        report.signal_errors = self.signal_errors.clone();
        report.left_running = left_running;
        info!(statuses = ?report.statuses, "termination verified");
        Ok(report)
    }
}

fn close_one(record: &mut ProcessRecord, control: &dyn ProcessControl) -> Result<()> {
    if record.status != RecordStatus::Running {
        debug!(
            name = %record.name,
            status = %record.status,
            "not running; skipping graceful signal"
        );
        return Ok(());
    }

    if control.state(record.pid).is_effectively_gone() {
        info!(name = %record.name, pid = record.pid, "process already gone; nothing to signal");
        return Ok(());
    }

    info!(name = %record.name, pid = record.pid, "sending SIGTERM");
    match control.terminate(record.pid)? {
        SignalOutcome::Delivered => {
            record.transition(Transition::GracefulSent)?;
            record.sigterm_time = Some(timestamp());
        }
        SignalOutcome::NoSuchProcess => {
            info!(name = %record.name, pid = record.pid, "process vanished before SIGTERM");
        }
    }
    Ok(())
}

async fn verify_one(
    record: &mut ProcessRecord,
    control: &dyn ProcessControl,
    kill_delay: Duration,
) -> Result<Verified> {
    if !matches!(
        record.status,
        RecordStatus::Running | RecordStatus::TerminateRequested | RecordStatus::KillRequested
    ) {
        debug!(name = %record.name, status = %record.status, "skipping verification");
        return Ok(Verified::Settled);
    }

    debug!(name = %record.name, pid = record.pid, "verifying termination");
    let state = control.state(record.pid);
    if state.is_effectively_gone() {
        mark_gone(record, state)?;
        return Ok(Verified::Settled);
    }

    if record.status == RecordStatus::Running {
        warn!(
            name = %record.name,
            pid = record.pid,
            "process still running but was never signalled"
        );
        return Ok(Verified::LeftRunning);
    }

    escalate(record, control, kill_delay).await?;
    Ok(Verified::Settled)
}

/// Record a PID that no longer runs.
fn mark_gone(record: &mut ProcessRecord, state: PidState) -> Result<()> {
    let transition = if record.status == RecordStatus::KillRequested {
        Transition::KillConfirmed
    } else {
        Transition::ConfirmedGone
    };
    record.transition(transition)?;
    if state == PidState::Zombie {
        record.note = Some(ZOMBIE_NOTE.to_string());
    }
    info!(name = %record.name, pid = record.pid, status = %record.status, zombie = state == PidState::Zombie, "process is gone");
    Ok(())
}

/// Send SIGKILL, wait `kill_delay` and probe once more.
///
/// Also used for records left in `SIGKILL requested` by an earlier run.
/// The status only moves once the signal was actually sent.
async fn escalate(
    record: &mut ProcessRecord,
    control: &dyn ProcessControl,
    kill_delay: Duration,
) -> Result<()> {
    warn!(name = %record.name, pid = record.pid, "SIGTERM ignored; sending SIGKILL");
    if control.kill(record.pid)? == SignalOutcome::NoSuchProcess {
        debug!(name = %record.name, pid = record.pid, "process exited before SIGKILL");
    }
    if record.status == RecordStatus::TerminateRequested {
        record.transition(Transition::KillSent)?;
    }
    record.sigkill_time = Some(timestamp());

    tokio::time::sleep(kill_delay).await;

    let state = control.state(record.pid);
    if state.is_effectively_gone() {
        mark_gone(record, state)?;
    } else {
        record.transition(Transition::KillFailed)?;
        error!(name = %record.name, pid = record.pid, "SIGKILL failed; process still running");
    }
    Ok(())
}
