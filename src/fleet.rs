// src/fleet.rs

//! The operations exposed to the CLI and to automation callers.
//!
//! A [`Fleet`] bundles a validated configuration with the capabilities the
//! core needs (spawning, process control, port probing, filesystem). The
//! production wiring comes from [`Fleet::new`]; tests swap individual
//! capabilities with the `with_*` builders.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::ConfigFile;
use crate::errors::{FleetError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::gate;
use crate::launch::{Launcher, ProcessSpawner, TokioSpawner};
use crate::probe::{PortProbe, ProcNetPortProbe, ProcessControl, SystemProcessControl};
use crate::shutdown::{Orchestrator, ShutdownReport};
use crate::store::{FileStatusStore, ProcessRecord, StatusStore};

/// Options for [`Fleet::start`].
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Directory for the status file instead of the config's directory.
    pub base_override: Option<PathBuf>,
    pub overwrite: bool,
    /// Settling wait before the port check.
    pub port_delay: Duration,
    /// Settling wait (and kill delay) when a failed start is rolled down.
    pub termination_delay: Duration,
}

/// Options for [`Fleet::stop`].
#[derive(Debug, Clone, Default)]
pub struct StopOptions {
    pub base_override: Option<PathBuf>,
    /// Settling wait after SIGTERM, also used as the kill delay.
    pub delay: Duration,
}

pub struct Fleet {
    config: ConfigFile,
    fs: Arc<dyn FileSystem>,
    spawner: Box<dyn ProcessSpawner>,
    control: Box<dyn ProcessControl>,
    ports: Box<dyn PortProbe>,
}

impl Fleet {
    /// Production wiring: real filesystem, Tokio spawner, OS probes.
    pub fn new(config: ConfigFile) -> Self {
        let ports = ProcNetPortProbe::new()
            .with_fallback_ports(config.processes.iter().map(|p| p.port));
        Self {
            config,
            fs: Arc::new(RealFileSystem),
            spawner: Box::new(TokioSpawner),
            control: Box::new(SystemProcessControl::new()),
            ports: Box::new(ports),
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_spawner(mut self, spawner: impl ProcessSpawner + 'static) -> Self {
        self.spawner = Box::new(spawner);
        self
    }

    pub fn with_process_control(mut self, control: impl ProcessControl + 'static) -> Self {
        self.control = Box::new(control);
        self
    }

    pub fn with_port_probe(mut self, ports: impl PortProbe + 'static) -> Self {
        self.ports = Box::new(ports);
        self
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn status_file_path(&self, base_override: Option<&Path>) -> PathBuf {
        self.config.status_file_path(base_override)
    }

    /// Create an empty status store; see [`FileStatusStore::create`].
    pub fn create_store(&self, base_override: Option<&Path>, overwrite: bool) -> Result<FileStatusStore> {
        let path = self.status_file_path(base_override);
        info!(path = %path.display(), "backend processes data file");
        FileStatusStore::create(Arc::clone(&self.fs), path, overwrite)
    }

    /// Open an existing status store; see [`FileStatusStore::open`].
    pub fn load_store(&self, base_override: Option<&Path>) -> Result<FileStatusStore> {
        let path = self.status_file_path(base_override);
        info!(path = %path.display(), "backend processes data file");
        FileStatusStore::open(Arc::clone(&self.fs), path)
    }

    /// Launch every configured process into `store`.
    pub fn launch_all(&self, store: &dyn StatusStore) -> Result<Vec<ProcessRecord>> {
        Launcher::new(self.spawner.as_ref(), store).launch_all(&self.config.processes)
    }

    /// Print what `launch_all` would do.
    pub fn dry_run(&self, store_path: &Path) {
        let store = crate::store::MemoryStatusStore::new().at(store_path);
        Launcher::new(self.spawner.as_ref(), &store).dry_run(&self.config.processes);
    }

    /// Fail on the first configured port that is not bound.
    pub fn verify_open_ports(&self) -> Result<()> {
        gate::verify_open_ports(&self.config.processes, self.ports.as_ref())
    }

    /// Load `store` for graceful/forceful shutdown.
    pub fn orchestrator<'a>(&'a self, store: &'a dyn StatusStore) -> Result<Orchestrator<'a>> {
        Orchestrator::load(store, self.control.as_ref())
    }

    /// Full start sequence.
    ///
    /// When a port is still closed after `port_delay`, everything recorded in
    /// the store is stopped again and the `PortClosed` error is returned,
    /// whether or not that rollback succeeds.
    pub async fn start(&self, options: &StartOptions) -> Result<Vec<ProcessRecord>> {
        let base = options.base_override.as_deref();
        let store = self.create_store(base, options.overwrite)?;
        let launched = self.launch_all(&store)?;
        info!("all processes have been started; verifying ports");

        tokio::time::sleep(options.port_delay).await;
        match self.verify_open_ports() {
            Ok(()) => {
                info!("backend processes successfully started");
                Ok(launched)
            }
            Err(err @ FleetError::PortClosed { .. }) => {
                error!(error = %err, "stopping all started backend processes");
                match self.roll_back(base, options.termination_delay).await {
                    Ok(report) if !report.all_stopped() => {
                        error!(problems = ?report.problems(), "rollback left processes behind");
                    }
                    Ok(_) => info!("all started backend processes stopped"),
                    Err(rollback) => error!(error = %rollback, "rollback failed"),
                }
                Err(err)
            }
            Err(other) => Err(other),
        }
    }

    /// Full stop sequence against the store left by a previous `start`.
    pub async fn stop(&self, options: &StopOptions) -> Result<ShutdownReport> {
        let store = self.load_store(options.base_override.as_deref())?;
        self.shut_down(&store, options.delay).await
    }

    async fn roll_back(&self, base: Option<&Path>, delay: Duration) -> Result<ShutdownReport> {
        let store = self.load_store(base)?;
        self.shut_down(&store, delay).await
    }

    async fn shut_down(&self, store: &dyn StatusStore, delay: Duration) -> Result<ShutdownReport> {
        let mut orchestrator = self.orchestrator(store)?;
        orchestrator.close_applications()?;
        tokio::time::sleep(delay).await;
        orchestrator.verify_termination(delay).await
    }
}
