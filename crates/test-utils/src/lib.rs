//! Test doubles and fixtures for driving `blockrun`'s controller without
//! touching the real filesystem or process table.

pub mod builders;
pub mod fake_launcher;
pub mod fake_process;
pub mod harness;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures (or with
/// `-- --nocapture`). `RUST_LOG` overrides the `blockrun=debug` default.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("blockrun=debug"));

        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Fail the test if `f` does not finish within five seconds.
pub async fn with_timeout<F: Future>(f: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("test timed out after 5 seconds")
}
