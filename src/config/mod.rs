// src/config/mod.rs

//! Process specification loading.
//!
//! - [`model`] holds the raw (as written) and validated shapes.
//! - [`validate`] turns a `RawConfigFile` into a `ConfigFile`, naming the
//!   first missing mandatory field.
//! - [`loader`] reads JSON or TOML from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ProcessSpec, RawConfigFile, RawProcessSpec};
