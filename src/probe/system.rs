// src/probe/system.rs

//! OS-backed [`ProcessControl`].
//!
//! Existence and zombie status come from `sysinfo`. Signals go through
//! `kill(2)` via `nix` on unix and through `sysinfo` elsewhere.

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use tracing::debug;

use crate::errors::Result;
use crate::probe::{PidState, ProcessControl, SignalOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for SystemProcessControl {
    fn state(&self, pid: u32) -> PidState {
        let sys_pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::new(),
        );

        let state = match system.process(sys_pid) {
            None => PidState::Gone,
            Some(process) if process.status() == ProcessStatus::Zombie => PidState::Zombie,
            Some(_) => PidState::Alive,
        };
        debug!(pid, ?state, "probed pid");
        state
    }

    fn terminate(&self, pid: u32) -> Result<SignalOutcome> {
        send(pid, Stop::Graceful)
    }

    fn kill(&self, pid: u32) -> Result<SignalOutcome> {
        send(pid, Stop::Forceful)
    }
}

#[derive(Debug, Clone, Copy)]
enum Stop {
    Graceful,
    Forceful,
}

#[cfg(unix)]
fn send(pid: u32, stop: Stop) -> Result<SignalOutcome> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid as NixPid;

    let signal = match stop {
        Stop::Graceful => Signal::SIGTERM,
        Stop::Forceful => Signal::SIGKILL,
    };

    let raw = i32::try_from(pid).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("pid {pid} out of range"))
    })?;

    match kill(NixPid::from_raw(raw), signal) {
        Ok(()) => {
            debug!(pid, ?signal, "signal delivered");
            Ok(SignalOutcome::Delivered)
        }
        Err(Errno::ESRCH) => Ok(SignalOutcome::NoSuchProcess),
        Err(errno) => Err(std::io::Error::from(errno).into()),
    }
}

#[cfg(not(unix))]
fn send(pid: u32, stop: Stop) -> Result<SignalOutcome> {
    let sys_pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sys_pid]),
        true,
        ProcessRefreshKind::new(),
    );

    let Some(process) = system.process(sys_pid) else {
        return Ok(SignalOutcome::NoSuchProcess);
    };

    let delivered = match stop {
        Stop::Graceful => process
            .kill_with(sysinfo::Signal::Term)
            .unwrap_or_else(|| process.kill()),
        Stop::Forceful => process.kill(),
    };

    if delivered {
        Ok(SignalOutcome::Delivered)
    } else {
        Err(anyhow::anyhow!("failed to signal pid {pid}").into())
    }
}
