//! Deterministic stand-ins for the OS-facing capabilities.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex};

use procfleet::errors::{FleetError, Result};
use procfleet::launch::{ChildHandle, LaunchCommand, ProcessSpawner};
use procfleet::probe::{PidState, PortProbe, ProcessControl, SignalOutcome};

/// A fake spawner that:
/// - hands out sequential PIDs starting at 1000
/// - records every command it was asked to run
/// - writes one line into the log file, like a real process would
/// - reports an immediate exit for names configured with `exits_with`
#[derive(Debug, Clone, Default)]
pub struct FakeSpawner {
    inner: Arc<Mutex<SpawnerState>>,
}

#[derive(Debug, Default)]
struct SpawnerState {
    next_pid: u32,
    spawned: Vec<(LaunchCommand, u32)>,
    exit_codes: HashMap<String, i32>,
    missing: Vec<String>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        let spawner = Self::default();
        spawner.inner.lock().unwrap().next_pid = 1000;
        spawner
    }

    /// The process named `name` is already dead at its first poll.
    pub fn exits_with(self, name: &str, code: i32) -> Self {
        self.inner
            .lock()
            .unwrap()
            .exit_codes
            .insert(name.to_string(), code);
        self
    }

    /// Spawning `name` fails as if the executable did not exist.
    pub fn missing_executable(self, name: &str) -> Self {
        self.inner.lock().unwrap().missing.push(name.to_string());
        self
    }

    /// Commands spawned so far, with the PID each one got.
    pub fn spawned(&self) -> Vec<(LaunchCommand, u32)> {
        self.inner.lock().unwrap().spawned.clone()
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, command: &LaunchCommand, mut log: File) -> std::io::Result<Box<dyn ChildHandle>> {
        let mut state = self.inner.lock().unwrap();
        if state.missing.contains(&command.name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", command.program),
            ));
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.spawned.push((command.clone(), pid));
        writeln!(log, "fake {} started", command.name)?;

        Ok(Box::new(FakeChild {
            pid,
            exit_code: state.exit_codes.get(&command.name).copied(),
        }))
    }
}

struct FakeChild {
    pid: u32,
    exit_code: Option<i32>,
}

impl ChildHandle for FakeChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll_exit(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self.exit_code)
    }
}

/// How a fake process reacts to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Exits cleanly on SIGTERM.
    ExitsOnTerm,
    /// Exits on SIGTERM but stays as a zombie.
    ZombieOnTerm,
    /// Ignores SIGTERM, exits on SIGKILL.
    ExitsOnKill,
    /// Ignores SIGTERM, becomes a zombie on SIGKILL.
    ZombieOnKill,
    /// Survives everything.
    Unkillable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentSignal {
    Term,
    Kill,
}

#[derive(Debug, Clone, Copy)]
struct FakeProcess {
    behaviour: Behaviour,
    state: PidState,
}

/// A process table driven by [`Behaviour`]s. Unknown PIDs are gone.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessControl {
    processes: Arc<Mutex<HashMap<u32, FakeProcess>>>,
    signals: Arc<Mutex<Vec<(u32, SentSignal)>>>,
    failing: Arc<Mutex<HashSet<(u32, SentSignal)>>>,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, behaviour: Behaviour) -> Self {
        self.processes.lock().unwrap().insert(
            pid,
            FakeProcess {
                behaviour,
                state: PidState::Alive,
            },
        );
        self
    }

    /// Sending `signal` to `pid` fails with `EPERM`. An unknown `pid` is
    /// added as [`Behaviour::Unkillable`].
    pub fn errors_on(self, pid: u32, signal: SentSignal) -> Self {
        self.processes
            .lock()
            .unwrap()
            .entry(pid)
            .or_insert(FakeProcess {
                behaviour: Behaviour::Unkillable,
                state: PidState::Alive,
            });
        self.failing.lock().unwrap().insert((pid, signal));
        self
    }

    /// Signals actually delivered, in order.
    pub fn signals(&self) -> Vec<(u32, SentSignal)> {
        self.signals.lock().unwrap().clone()
    }

    fn deliver(&self, pid: u32, signal: SentSignal) -> Result<SignalOutcome> {
        if self.failing.lock().unwrap().contains(&(pid, signal)) {
            return Err(FleetError::IoError(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )));
        }
        Ok(self.deliver_ok(pid, signal))
    }

    fn deliver_ok(&self, pid: u32, signal: SentSignal) -> SignalOutcome {
        let mut processes = self.processes.lock().unwrap();
        let Some(process) = processes.get_mut(&pid) else {
            return SignalOutcome::NoSuchProcess;
        };
        if process.state == PidState::Gone {
            return SignalOutcome::NoSuchProcess;
        }
        self.signals.lock().unwrap().push((pid, signal));

        let next = match (process.behaviour, signal) {
            (Behaviour::ExitsOnTerm, _) | (Behaviour::ExitsOnKill, SentSignal::Kill) => {
                PidState::Gone
            }
            (Behaviour::ZombieOnTerm, _) | (Behaviour::ZombieOnKill, SentSignal::Kill) => {
                PidState::Zombie
            }
            _ => process.state,
        };
        process.state = next;
        SignalOutcome::Delivered
    }
}

impl ProcessControl for FakeProcessControl {
    fn state(&self, pid: u32) -> PidState {
        self.processes
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.state)
            .unwrap_or(PidState::Gone)
    }

    fn terminate(&self, pid: u32) -> Result<SignalOutcome> {
        self.deliver(pid, SentSignal::Term)
    }

    fn kill(&self, pid: u32) -> Result<SignalOutcome> {
        self.deliver(pid, SentSignal::Kill)
    }
}

/// A fixed set of bound ports.
#[derive(Debug, Clone, Default)]
pub struct FakePortProbe {
    bound: BTreeSet<u16>,
}

impl FakePortProbe {
    pub fn new(bound: impl IntoIterator<Item = u16>) -> Self {
        Self {
            bound: bound.into_iter().collect(),
        }
    }
}

impl PortProbe for FakePortProbe {
    fn bound_ports(&self) -> Result<BTreeSet<u16>> {
        Ok(self.bound.clone())
    }
}
