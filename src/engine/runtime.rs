// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{JobgateError, Result};
use crate::exec::ExecutorBackend;
use crate::types::JobOutcome;

use super::shared::SharedScheduler;

/// Runtime options for the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Number of concurrent worker tasks; clamped to at least 1.
    pub workers: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// What a finished (or cancelled) run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs that completed successfully, in completion order.
    pub succeeded: Vec<String>,
    /// Jobs that failed, including dependents failed by cascade.
    pub failed: Vec<String>,
    /// Jobs still blocked when the run stopped.
    pub stranded: Vec<String>,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.stranded.is_empty()
    }
}

/// Worker pool that drains a [`SharedScheduler`] through an
/// [`ExecutorBackend`].
///
/// Each worker parks in `wait_next`, executes the job it receives and
/// reports the outcome. The run ends when the scheduler is quiescent
/// (nothing ready, nothing in flight) or when the cancellation token is
/// cancelled from outside (e.g. Ctrl-C). Jobs already executing are allowed
/// to finish and report.
pub struct Runtime<E: ExecutorBackend> {
    scheduler: SharedScheduler,
    executor: Arc<E>,
    options: RuntimeOptions,
    cancel: CancellationToken,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(scheduler: SharedScheduler, executor: E, options: RuntimeOptions) -> Self {
        Self {
            scheduler,
            executor: Arc::new(executor),
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the run when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Main loop: spawn the workers and wait for all of them.
    pub async fn run(self) -> Result<RunSummary> {
        let workers = self.options.workers.max(1);
        info!(workers, "jobgate runtime started");

        if self.scheduler.is_quiescent() {
            debug!("nothing ready at startup");
            self.cancel.cancel();
        }

        let mut set = JoinSet::new();
        for worker in 0..workers {
            set.spawn(worker_loop(
                worker,
                self.scheduler.clone(),
                Arc::clone(&self.executor),
                self.cancel.clone(),
            ));
        }

        let mut summary = RunSummary::default();
        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(report)) => summary.merge(report),
                Ok(Err(err)) => {
                    self.cancel.cancel();
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(join_err) => {
                    self.cancel.cancel();
                    if first_error.is_none() {
                        first_error = Some(JobgateError::Other(anyhow::anyhow!(
                            "worker task failed: {join_err}"
                        )));
                    }
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        summary.stranded = self.scheduler.blocked_ids();
        if !summary.stranded.is_empty() {
            warn!(stranded = ?summary.stranded, "run stopped with jobs still blocked");
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            stranded = summary.stranded.len(),
            "runtime exiting"
        );
        Ok(summary)
    }
}

async fn worker_loop<E: ExecutorBackend>(
    worker: usize,
    scheduler: SharedScheduler,
    executor: Arc<E>,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let mut report = RunSummary::default();
    debug!(worker, "worker started");

    while let Some(job) = scheduler.wait_next(&cancel).await {
        let id = job.id().to_string();
        debug!(worker, job = %id, "worker picked up job");

        let step = match executor.execute(job).await {
            JobOutcome::Succeeded => {
                report.succeeded.push(id.clone());
                scheduler.complete(&id)?
            }
            JobOutcome::Failed { reason } => scheduler.complete_failed(&id, reason)?,
        };
        report.failed.extend(step.newly_failed);

        if scheduler.is_quiescent() {
            debug!(worker, "scheduler quiescent; stopping workers");
            cancel.cancel();
        }
    }

    debug!(worker, "worker finished");
    Ok(report)
}
