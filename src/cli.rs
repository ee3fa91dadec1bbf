// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `procfleet`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procfleet",
    version,
    about = "Start, track and stop the backend processes needed by integration tests.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCFLEET_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Launch every configured process and wait for their ports.
    Start(StartArgs),
    /// Stop the processes recorded in the status file.
    Stop(StopArgs),
    /// Print the records in the status file.
    Status(StatusArgs),
}

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    /// Configuration file describing the backend processes (JSON or TOML).
    #[arg(short, long, value_name = "PATH")]
    pub backend: PathBuf,

    /// Folder for the status file and logs. Defaults to the configuration
    /// file's directory.
    #[arg(short, long, value_name = "DIR")]
    pub log_folder: Option<PathBuf>,

    /// Replace an existing status file.
    #[arg(short, long)]
    pub overwrite: bool,

    /// Seconds to wait before checking that all ports are open.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub port_delay: u64,

    /// Seconds to wait before verifying termination after a failed start.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub termination_delay: u64,

    /// Parse + validate, print the processes, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct StopArgs {
    /// Configuration file describing the backend processes (JSON or TOML).
    #[arg(short, long, value_name = "PATH")]
    pub backend: PathBuf,

    /// Folder holding the status file. Defaults to the configuration file's
    /// directory.
    #[arg(short, long, value_name = "DIR")]
    pub process_data: Option<PathBuf>,

    /// Seconds to wait before verifying that the processes terminated.
    #[arg(short, long, value_name = "SECS", default_value_t = 1)]
    pub delay: u64,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Configuration file describing the backend processes (JSON or TOML).
    #[arg(short, long, value_name = "PATH")]
    pub backend: PathBuf,

    /// Folder holding the status file.
    #[arg(short, long, value_name = "DIR")]
    pub process_data: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
