// src/engine/shared.rs

//! Thread-safe handle around the scheduler.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::dag::{Admission, DependencyUpdate, Scheduler, SchedulerStep, Stats};
use crate::errors::Result;
use crate::job::{Job, JobSpec};
use crate::types::{EdgePolicy, JobState};

/// Cloneable handle shared by job producers and consumers.
///
/// Every operation runs under one mutex, so dispatch and promotion never
/// interleave: a job can only be handed to a single `next()` caller.
/// Operations that make jobs ready wake any task parked in
/// [`SharedScheduler::wait_next`].
#[derive(Clone)]
pub struct SharedScheduler {
    inner: Arc<Mutex<Scheduler>>,
    ready_signal: Arc<Notify>,
}

impl fmt::Debug for SharedScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never lock here: Debug may run while the lock is held.
        f.debug_struct("SharedScheduler").finish_non_exhaustive()
    }
}

impl SharedScheduler {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(scheduler)),
            ready_signal: Arc::new(Notify::new()),
        }
    }

    /// Every scheduler operation validates before mutating, so state behind
    /// a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_consumers(&self) {
        trace!("waking consumers waiting for ready jobs");
        self.ready_signal.notify_waiters();
    }

    fn wake_if_promoted(&self, step: &SchedulerStep) {
        if !step.newly_ready.is_empty() {
            self.wake_consumers();
        }
    }

    /// Run a read-only closure against the scheduler under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&Scheduler) -> R) -> R {
        f(&self.lock())
    }

    pub fn submit(&self, spec: JobSpec) -> Result<Admission> {
        let admission = self.lock().submit(spec)?;
        if admission.state == JobState::Ready {
            self.wake_consumers();
        }
        Ok(admission)
    }

    pub fn add_dependency<I, S>(&self, id: &str, depends_on: I) -> Result<DependencyUpdate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let update = self.lock().add_dependency(id, depends_on)?;
        self.wake_if_promoted(&update.step);
        Ok(update)
    }

    pub fn add_dependency_with_policy<I, S>(
        &self,
        id: &str,
        depends_on: I,
        policy: EdgePolicy,
    ) -> Result<DependencyUpdate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let update = self
            .lock()
            .add_dependency_with_policy(id, depends_on, policy)?;
        self.wake_if_promoted(&update.step);
        Ok(update)
    }

    /// Non-blocking dispatch; `None` when nothing is ready.
    pub fn next(&self) -> Option<Job> {
        self.lock().next()
    }

    /// Wait until a job can be dispatched or `cancel` fires.
    ///
    /// Returns `None` once the token is cancelled. The wake-up is registered
    /// before the ready set is checked, so a promotion that happens between
    /// the check and the wait is never missed.
    pub async fn wait_next(&self, cancel: &CancellationToken) -> Option<Job> {
        loop {
            let notified = self.ready_signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if cancel.is_cancelled() {
                return None;
            }
            if let Some(job) = self.next() {
                return Some(job);
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    pub fn complete(&self, id: &str) -> Result<SchedulerStep> {
        let step = self.lock().complete(id)?;
        self.wake_if_promoted(&step);
        Ok(step)
    }

    pub fn complete_failed(&self, id: &str, reason: impl Into<String>) -> Result<SchedulerStep> {
        let step = self.lock().complete_failed(id, reason)?;
        self.wake_if_promoted(&step);
        Ok(step)
    }

    pub fn purge(&self, id: &str) -> Result<Job> {
        self.lock().purge(id)
    }

    pub fn state_of(&self, id: &str) -> Option<JobState> {
        self.lock().state_of(id)
    }

    pub fn stats(&self) -> Stats {
        self.lock().stats()
    }

    pub fn is_quiescent(&self) -> bool {
        self.lock().is_quiescent()
    }

    pub fn blocked_ids(&self) -> Vec<String> {
        self.lock().blocked_ids()
    }
}
