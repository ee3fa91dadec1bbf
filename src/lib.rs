// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fleet;
pub mod fs;
pub mod gate;
pub mod launch;
pub mod logging;
pub mod probe;
pub mod shutdown;
pub mod store;

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::cli::{CliArgs, Command, StartArgs, StatusArgs, StopArgs};
use crate::config::load_and_validate;
use crate::store::StatusStore;

pub use crate::fleet::{Fleet, StartOptions, StopOptions};

/// High-level entry point used by `main.rs`.
///
/// Loads the configuration and dispatches to the requested subcommand using
/// the production wiring of [`Fleet`].
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Start(start) => run_start(start).await,
        Command::Stop(stop) => run_stop(stop).await,
        Command::Status(status) => run_status(status),
    }
}

async fn run_start(args: StartArgs) -> Result<()> {
    let fleet = Fleet::new(load_and_validate(&args.backend)?);

    if args.dry_run {
        fleet.dry_run(&fleet.status_file_path(args.log_folder.as_deref()));
        return Ok(());
    }

    let options = StartOptions {
        base_override: args.log_folder,
        overwrite: args.overwrite,
        port_delay: Duration::from_secs(args.port_delay),
        termination_delay: Duration::from_secs(args.termination_delay),
    };
    let launched = fleet.start(&options).await?;
    info!(count = launched.len(), "host applications successfully started");
    Ok(())
}

async fn run_stop(args: StopArgs) -> Result<()> {
    let fleet = Fleet::new(load_and_validate(&args.backend)?);
    let options = StopOptions {
        base_override: args.process_data,
        delay: Duration::from_secs(args.delay),
    };

    let report = fleet.stop(&options).await?;
    if !report.all_stopped() {
        bail!("shutdown incomplete: {}", report.problems().join("; "));
    }
    info!("all processes have been terminated");
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<()> {
    let fleet = Fleet::new(load_and_validate(&args.backend)?);
    let store = fleet.load_store(args.process_data.as_deref())?;
    let records = store.load()?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
