//! Shared helpers for the cronmanager integration tests.

pub mod builders;
pub mod recording_sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Longest any single supervised run may take in a test.
const RUN_TIMEOUT: Duration = Duration::from_secs(20);

/// Route supervisor and store logs into the per-test capture.
///
/// Defaults to `info`; `RUST_LOG=cronmanager=debug` shows every metric write.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await a supervised run, failing the test if the job hangs.
pub async fn with_timeout<F, T>(run: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, run).await {
        Ok(value) => value,
        Err(_) => panic!("supervised run did not finish within {RUN_TIMEOUT:?}"),
    }
}
