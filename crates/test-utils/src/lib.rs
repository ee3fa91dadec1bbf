//! Shared helpers for the `procfleet` integration tests.
//!
//! - [`builders`]: configs, specs and records with sensible defaults.
//! - [`fakes`]: in-memory spawner, process table and port probe.

pub mod builders;
pub mod fakes;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Route `tracing` output into the test harness capture.
///
/// Output shows up for failing tests only (or with `--nocapture`). The
/// filter comes from `RUST_LOG` and defaults to `procfleet=debug`, so the
/// state transitions of the code under test are visible.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,procfleet=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Fail the test if `future` takes longer than five seconds.
pub async fn with_timeout<F, T>(future: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("test timed out after 5 seconds")
}
