// src/launch/spawner.rs

//! Pluggable process spawning.
//!
//! The launcher talks to a [`ProcessSpawner`] instead of `Command` directly,
//! so tests can hand out fake children with chosen PIDs and exit codes.

use std::fs::File;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

/// Everything needed to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

/// A spawned process as seen right after spawn.
pub trait ChildHandle: Send {
    fn pid(&self) -> u32;

    /// Non-blocking poll: `None` while running, `Some(code)` once exited.
    fn poll_exit(&mut self) -> std::io::Result<Option<i32>>;
}

/// Starts OS processes with stdout and stderr redirected into `log`.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, command: &LaunchCommand, log: File) -> std::io::Result<Box<dyn ChildHandle>>;
}

/// Production spawner built on `tokio::process::Command`.
///
/// Must be called from within a Tokio runtime. Children are *not* killed
/// when their handle is dropped; they outlive this process by design of the
/// start/stop split.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, command: &LaunchCommand, log: File) -> std::io::Result<Box<dyn ChildHandle>> {
        let stderr_log = log.try_clone()?;

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr_log))
            .kill_on_drop(false)
            .spawn()?;

        let pid = child.id().ok_or_else(|| {
            std::io::Error::other(format!("process '{}' has no pid after spawn", command.name))
        })?;
        debug!(name = %command.name, pid, "spawned process");

        Ok(Box::new(TokioChild { child, pid }))
    }
}

struct TokioChild {
    child: Child,
    pid: u32,
}

impl ChildHandle for TokioChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll_exit(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }
}
