// src/probe/ports.rs

//! TCP listener enumeration.
//!
//! On Linux the socket tables in `/proc/net/tcp` and `/proc/net/tcp6` are
//! read directly. Each row's `local_address` column looks like
//! `0100007F:0CEA` (address and port in hex); every socket state counts.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::probe::PortProbe;

/// [`PortProbe`] backed by the procfs socket tables.
#[derive(Debug, Clone)]
pub struct ProcNetPortProbe {
    tables: Vec<PathBuf>,
    /// Ports to try binding when no table is readable.
    fallback_ports: Vec<u16>,
}

impl Default for ProcNetPortProbe {
    fn default() -> Self {
        Self {
            tables: vec![
                PathBuf::from("/proc/net/tcp"),
                PathBuf::from("/proc/net/tcp6"),
            ],
            fallback_ports: Vec::new(),
        }
    }
}

impl ProcNetPortProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from custom table files instead of procfs.
    pub fn with_tables(tables: Vec<PathBuf>) -> Self {
        Self {
            tables,
            fallback_ports: Vec::new(),
        }
    }

    /// Ports to check with a bind attempt on hosts without procfs.
    pub fn with_fallback_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.fallback_ports = ports.into_iter().collect();
        self
    }
}

impl PortProbe for ProcNetPortProbe {
    fn bound_ports(&self) -> Result<BTreeSet<u16>> {
        let mut ports = BTreeSet::new();
        let mut readable = 0usize;

        for table in &self.tables {
            match std::fs::read_to_string(table) {
                Ok(content) => {
                    readable += 1;
                    ports.extend(parse_socket_table(&content));
                }
                Err(e) => debug!(table = %table.display(), error = %e, "socket table unreadable"),
            }
        }

        if readable == 0 {
            warn!("no socket table readable; falling back to bind probing");
            ports.extend(
                self.fallback_ports
                    .iter()
                    .copied()
                    .filter(|port| bind_fails(*port)),
            );
        }

        Ok(ports)
    }
}

/// Extract local ports from a `/proc/net/tcp`-formatted table.
///
/// The header row and malformed rows are skipped.
pub fn parse_socket_table(content: &str) -> BTreeSet<u16> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let local = line.split_whitespace().nth(1)?;
            let (_, port_hex) = local.rsplit_once(':')?;
            u16::from_str_radix(port_hex, 16).ok()
        })
        .collect()
}

/// A port is treated as bound when the loopback address cannot take it.
fn bind_fails(port: u16) -> bool {
    std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:0D05 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 31337 1 0000000000000000 100 0 0 10 0
   1: 00000000:28D6 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 31338 1 0000000000000000 100 0 0 10 0
   2: 0100007F:A1B2 0100007F:0D05 01 00000000:00000000 00:00000000 00000000  1000        0 31339 1 0000000000000000 20 4 30 10 -1
";

    const TCP6: &str = "  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000000000000:0D3D 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 41 1 0000000000000000 100 0 0 10 0
";

    #[test]
    fn parses_ipv4_rows_in_any_state() {
        let ports = parse_socket_table(TCP);
        // 0x0D05 = 3333, 0x28D6 = 10454, 0xA1B2 = 41394 (established)
        assert_eq!(ports, BTreeSet::from([3333, 10454, 41394]));
    }

    #[test]
    fn parses_ipv6_rows() {
        assert_eq!(parse_socket_table(TCP6), BTreeSet::from([3389]));
    }

    #[test]
    fn reads_custom_tables() {
        let dir = tempfile::tempdir().unwrap();
        let v4 = dir.path().join("tcp");
        let v6 = dir.path().join("tcp6");
        std::fs::write(&v4, TCP).unwrap();
        std::fs::write(&v6, TCP6).unwrap();

        let probe = ProcNetPortProbe::with_tables(vec![v4, v6]);
        assert!(probe.port_bound(3333).unwrap());
        assert!(probe.port_bound(3389).unwrap());
        assert!(!probe.port_bound(4444).unwrap());
    }

    #[test]
    fn falls_back_to_bind_probe_without_tables() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = ProcNetPortProbe::with_tables(vec![PathBuf::from("/definitely/missing")])
            .with_fallback_ports([port]);
        assert!(probe.port_bound(port).unwrap());
    }
}
