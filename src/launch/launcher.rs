// src/launch/launcher.rs

//! Launch every configured process and record it in the status store.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::ProcessSpec;
use crate::errors::{FleetError, Result};
use crate::launch::spawner::{LaunchCommand, ProcessSpawner};
use crate::store::{ProcessRecord, StatusStore};

/// Spawns processes one at a time, in declaration order.
pub struct Launcher<'a> {
    spawner: &'a dyn ProcessSpawner,
    store: &'a dyn StatusStore,
}

impl<'a> Launcher<'a> {
    pub fn new(spawner: &'a dyn ProcessSpawner, store: &'a dyn StatusStore) -> Self {
        Self { spawner, store }
    }

    /// Launch every spec, appending one record per success.
    ///
    /// The first failure aborts the batch. Processes launched before it keep
    /// running and keep their records; nothing is rolled back.
    pub fn launch_all(&self, specs: &[ProcessSpec]) -> Result<Vec<ProcessRecord>> {
        let mut launched = Vec::with_capacity(specs.len());
        for spec in specs {
            launched.push(self.launch(spec)?);
        }
        info!(count = launched.len(), "all processes launched");
        Ok(launched)
    }

    /// Launch a single spec. The log file is created (or truncated) on disk;
    /// see [`Launcher::log_path`].
    pub fn launch(&self, spec: &ProcessSpec) -> Result<ProcessRecord> {
        let log_path = self.log_path(spec);
        info!(name = %spec.name, log = %log_path.display(), "opening log file");
        let log = File::create(&log_path)?;

        let command = LaunchCommand {
            name: spec.name.clone(),
            program: spec.path.clone(),
            args: spec.arguments.clone(),
        };

        let mut child = self
            .spawner
            .spawn(&command, log)
            .map_err(|source| FleetError::SpawnFailed {
                name: spec.name.clone(),
                source,
            })?;

        // A process that is already gone at this point is almost always
        // misconfigured; fail fast instead of retrying.
        if let Some(code) = child.poll_exit()? {
            error!(name = %spec.name, code, "process exited immediately after launch");
            return Err(FleetError::LaunchFailed {
                name: spec.name.clone(),
                code,
            });
        }

        let record = ProcessRecord::running(spec, child.pid());
        info!(
            name = %record.name,
            pid = record.pid,
            process_call = %record.process_call,
            "process is running"
        );
        self.store.append(record.clone())?;
        Ok(record)
    }

    /// Log files live next to the status file.
    ///
    /// They are always created on the real disk, even when the store sits on
    /// another [`crate::fs::FileSystem`]: the spawned process needs a real
    /// file handle for its output.
    pub fn log_path(&self, spec: &ProcessSpec) -> PathBuf {
        log_dir(self.store.location()).join(&spec.log_file)
    }

    /// Print what would be launched without spawning anything.
    pub fn dry_run(&self, specs: &[ProcessSpec]) {
        println!("procfleet dry-run");
        println!("  status file: {}", self.store.location().display());
        println!();
        println!("processes ({}):", specs.len());
        for spec in specs {
            println!("  - {}", spec.name);
            println!("      call: {}", spec.process_call());
            println!("      port: {}", spec.port);
            println!("      log: {}", self.log_path(spec).display());
        }
    }
}

fn log_dir(status_file: &Path) -> &Path {
    match status_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
