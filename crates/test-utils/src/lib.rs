pub mod builders;
pub mod fake_executor;

use std::sync::Once;

use jobgate::dag::Scheduler;
use jobgate::job::{JobSpec, Priority};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=jobgate=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Shorthand for a job spec with the given priority and no prerequisites.
pub fn spec(id: &str, priority: Priority) -> JobSpec {
    JobSpec::new(id, "test").priority(priority)
}

/// Dispatch and immediately complete jobs until nothing is ready,
/// returning ids in dispatch order.
pub fn drain(scheduler: &mut Scheduler) -> Vec<String> {
    let mut order = Vec::new();
    while let Some(job) = scheduler.next() {
        scheduler
            .complete(job.id())
            .expect("completing a dispatched job succeeds");
        order.push(job.id().to_string());
    }
    order
}

/// Dispatch every ready job without completing any, returning ids in
/// dispatch order.
pub fn dispatch_all(scheduler: &mut Scheduler) -> Vec<String> {
    std::iter::from_fn(|| scheduler.next())
        .map(|job| job.id().to_string())
        .collect()
}
