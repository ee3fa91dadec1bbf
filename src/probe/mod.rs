// src/probe/mod.rs

//! Liveness probing.
//!
//! Two narrow capabilities, both point-in-time with no caching:
//!
//! - [`ProcessControl`]: does a PID exist, is it a zombie, and send it a
//!   graceful or forceful stop signal.
//! - [`PortProbe`]: which local TCP ports have a socket bound to them.
//!
//! Production implementations live in [`system`] and [`ports`]; tests swap in
//! fakes so the orchestrator never touches real processes.

pub mod ports;
pub mod system;

use std::collections::BTreeSet;

use crate::errors::Result;

pub use ports::ProcNetPortProbe;
pub use system::SystemProcessControl;

/// What the OS reports for a PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidState {
    /// No such process.
    Gone,
    /// Exited but not yet reaped by its parent.
    Zombie,
    /// Running (or sleeping, stopped, ...).
    Alive,
}

impl PidState {
    /// A zombie still has a PID but will never run again.
    pub fn is_effectively_gone(self) -> bool {
        matches!(self, PidState::Gone | PidState::Zombie)
    }
}

/// Result of sending a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    /// The target was already gone when the signal was sent.
    NoSuchProcess,
}

/// Process inspection and signalling addressed by PID.
pub trait ProcessControl: Send + Sync {
    fn state(&self, pid: u32) -> PidState;

    /// Send the graceful stop signal (SIGTERM).
    fn terminate(&self, pid: u32) -> Result<SignalOutcome>;

    /// Send the forceful stop signal (SIGKILL).
    fn kill(&self, pid: u32) -> Result<SignalOutcome>;

    /// True while the PID resolves, zombies included.
    fn pid_alive(&self, pid: u32) -> bool {
        self.state(pid) != PidState::Gone
    }
}

/// Enumeration of bound local TCP ports.
pub trait PortProbe: Send + Sync {
    /// Every local port with a TCP socket in any state.
    fn bound_ports(&self) -> Result<BTreeSet<u16>>;

    fn port_bound(&self, port: u16) -> Result<bool> {
        Ok(self.bound_ports()?.contains(&port))
    }
}
