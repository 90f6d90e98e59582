// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The worker runtime hands every dispatched job to an `ExecutorBackend`
//! and reports the returned outcome back to the scheduler. Actually moving
//! data (extract/transform/load) is the backend's business; the scheduler
//! only sees the outcome.
//!
//! - `LoggingExecutor` is the default implementation used by the `jobgate`
//!   binary. It records the dispatch in the log and reports success.
//! - Tests can provide their own `ExecutorBackend` that, for example,
//!   records which jobs ran and fails selected ones.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::job::Job;
use crate::types::JobOutcome;

/// Trait abstracting how dispatched jobs are executed.
pub trait ExecutorBackend: Send + Sync + 'static {
    /// Run one job to completion and report how it went.
    ///
    /// Failures are reported as [`JobOutcome::Failed`]; retrying is up to
    /// the backend, the scheduler never retries.
    fn execute(&self, job: Job) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + '_>>;
}

/// Executor that only logs each job it receives.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

impl LoggingExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutorBackend for LoggingExecutor {
    fn execute(&self, job: Job) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + '_>> {
        Box::pin(async move {
            let config_keys: Vec<&str> = job.config().keys().map(String::as_str).collect();
            info!(
                job = %job.id(),
                kind = %job.kind(),
                priority = %job.priority(),
                ?config_keys,
                "executing job"
            );
            JobOutcome::Succeeded
        })
    }
}
