// src/dag/state_manager.rs

//! Lifecycle transitions for jobs in the scheduler.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::job::{Job, JobKey};
use crate::queue::ReadyQueue;
use crate::types::{JobOutcome, JobState};

/// Blocked jobs, each with its number of prerequisites still outstanding.
#[derive(Debug, Default, Clone)]
pub struct BlockedPool {
    remaining: HashMap<JobKey, usize>,
}

impl BlockedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: JobKey, outstanding: usize) {
        self.remaining.insert(job, outstanding);
    }

    pub fn remove(&mut self, job: JobKey) -> Option<usize> {
        self.remaining.remove(&job)
    }

    pub fn contains(&self, job: JobKey) -> bool {
        self.remaining.contains_key(&job)
    }

    pub fn outstanding(&self, job: JobKey) -> Option<usize> {
        self.remaining.get(&job).copied()
    }

    /// Add newly registered prerequisites to a blocked job's count.
    pub fn add_outstanding(&mut self, job: JobKey, extra: usize) {
        if let Some(count) = self.remaining.get_mut(&job) {
            *count += extra;
        }
    }

    /// One prerequisite of `job` completed. Returns `true` (and removes the
    /// job from the pool) when that was the last one.
    pub fn settle_one(&mut self, job: JobKey) -> bool {
        match self.remaining.get_mut(&job) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.remaining.remove(&job);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Applies completions and their knock-on effects across all structures.
///
/// Borrows the scheduler's parts for the duration of one operation so the
/// "a job lives in exactly one place" rule is maintained in one spot.
pub struct StateManager<'a> {
    pub jobs: &'a mut HashMap<JobKey, Job>,
    pub graph: &'a mut DependencyGraph,
    pub blocked: &'a mut BlockedPool,
    pub ready: &'a mut ReadyQueue,
    pub completed_order: &'a mut VecDeque<JobKey>,
}

impl StateManager<'_> {
    /// Move a blocked job into the ready queue.
    pub fn promote(&mut self, key: JobKey) -> Option<String> {
        let job = self.jobs.get_mut(&key)?;
        job.set_state(JobState::Ready);
        self.ready.push(job.priority(), key);
        debug!(job = %job.id(), priority = %job.priority(), "dependencies satisfied; marking Ready");
        Some(job.id().to_string())
    }

    /// Complete `key` with `outcome`, then settle everything downstream:
    /// dependents that became satisfied are promoted, dependents behind a
    /// strict edge of a failed job are failed in turn (transitively).
    ///
    /// Completing an already-completed job is a no-op reported via
    /// `already_completed`.
    pub fn finish(&mut self, key: JobKey, outcome: JobOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if self.graph.is_completed(key) {
            step.already_completed = true;
            return step;
        }

        let Some(id) = self.finish_one(key, outcome.clone()) else {
            return step;
        };
        if let JobOutcome::Failed { reason } = &outcome {
            warn!(job = %id, %reason, "job failed");
            step.newly_failed.push(id);
        } else {
            debug!(job = %id, "job completed successfully");
        }

        let mut settled = vec![key];
        while let Some(done) = settled.pop() {
            let unblocked = self.graph.newly_unblocked(done, self.blocked);

            for ready_key in unblocked.ready {
                if let Some(id) = self.promote(ready_key) {
                    step.newly_ready.push(id);
                }
            }

            let upstream = self
                .jobs
                .get(&done)
                .map(|j| j.id().to_string())
                .unwrap_or_default();
            for doomed in unblocked.doomed {
                let reason = format!("prerequisite '{upstream}' failed");
                if let Some(id) = self.finish_one(doomed, JobOutcome::failed(reason)) {
                    warn!(job = %id, prerequisite = %upstream, "required prerequisite failed; failing dependent");
                    step.newly_failed.push(id);
                    settled.push(doomed);
                }
            }
        }

        step
    }

    /// Mark a single job completed and pull it out of whichever structure
    /// holds it. Does not touch dependents.
    fn finish_one(&mut self, key: JobKey, outcome: JobOutcome) -> Option<String> {
        let job = self.jobs.get_mut(&key)?;

        match job.state() {
            JobState::Ready => {
                self.ready.remove(key);
            }
            JobState::Blocked => {
                self.blocked.remove(key);
            }
            JobState::Dispatched | JobState::Completed => {}
        }

        job.finish(outcome.clone());
        self.graph.mark_completed(key, outcome);
        self.completed_order.push_back(key);
        Some(job.id().to_string())
    }
}
