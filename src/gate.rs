// src/gate.rs

//! Readiness gate: every configured port must be bound.

use tracing::{debug, error, info};

use crate::config::ProcessSpec;
use crate::errors::{FleetError, Result};
use crate::probe::PortProbe;

/// Fail on the first spec whose port is not bound.
///
/// The listener set is enumerated once; the caller is responsible for
/// having waited long enough for the processes to bind.
pub fn verify_open_ports(specs: &[ProcessSpec], probe: &dyn PortProbe) -> Result<()> {
    let bound = probe.bound_ports()?;
    debug!(bound = ?bound, "enumerated bound ports");

    for spec in specs {
        if !bound.contains(&spec.port) {
            error!(name = %spec.name, port = spec.port, "port is not open");
            return Err(FleetError::PortClosed {
                port: spec.port,
                name: spec.name.clone(),
            });
        }
        debug!(name = %spec.name, port = spec.port, "port is open");
    }

    info!(count = specs.len(), "all ports are open");
    Ok(())
}
