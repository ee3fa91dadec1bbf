// src/launch/mod.rs

//! Process launching.
//!
//! - [`spawner`] provides the `ProcessSpawner` trait and the Tokio-based
//!   production implementation.
//! - [`launcher`] walks the specification list, opens each log file, spawns,
//!   checks for an immediate exit and appends a record to the status store.

pub mod launcher;
pub mod spawner;

pub use launcher::Launcher;
pub use spawner::{ChildHandle, LaunchCommand, ProcessSpawner, TokioSpawner};
