pub mod builders;
pub mod fakes;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests (or with `-- --nocapture`). `RUST_LOG` overrides the default of
/// `info` with `debug` for buildrun itself.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,buildrun=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test after 5 seconds.
///
/// Under a paused tokio clock the limit is virtual time, so only wrap futures
/// that do not depend on the clock auto-advancing past it.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_secs(5, f).await
}

pub async fn with_timeout_secs<F, T>(secs: u64, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(Duration::from_secs(secs), f).await {
        Ok(value) => value,
        Err(_) => panic!("test timed out after {secs} seconds"),
    }
}
