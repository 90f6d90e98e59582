// src/dag/scheduler.rs

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::config::model::JobFile;
use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler_step::{Admission, DependencyUpdate, SchedulerStep, Stats};
use crate::dag::state_manager::{BlockedPool, StateManager};
use crate::errors::{JobgateError, Result};
use crate::job::{Job, JobKey, JobSpec};
use crate::queue::ReadyQueue;
use crate::types::{EdgePolicy, JobOutcome, JobState, Retention};

/// Tunables for a [`Scheduler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Policy for dependency edges whose submission did not pick one.
    pub default_edge_policy: EdgePolicy,
    /// How many completed records to keep for later dependency checks.
    pub retention: Retention,
}

/// Dependency-gated priority scheduler.
///
/// It is responsible for:
/// - admitting jobs and assigning their submission sequence
/// - keeping blocked jobs out of the ready queue until every prerequisite
///   has completed
/// - dispatching ready jobs by `(priority, sequence)`
/// - promoting (or failing) dependents when a job completes
///
/// This type is single-threaded; [`crate::engine::SharedScheduler`] wraps it
/// in one lock for concurrent producers and consumers.
#[derive(Debug, Default)]
pub struct Scheduler {
    options: SchedulerOptions,
    jobs: HashMap<JobKey, Job>,
    index: HashMap<String, JobKey>,
    graph: DependencyGraph,
    ready: ReadyQueue,
    blocked: BlockedPool,
    /// Completed jobs in completion order; drives eviction.
    completed_order: VecDeque<JobKey>,
    next_sequence: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SchedulerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Build a scheduler from a validated [`JobFile`], submitting every job
    /// in dependency order.
    pub fn from_config(cfg: &JobFile) -> Result<Self> {
        let mut scheduler = Self::with_options(cfg.scheduler.options());
        for spec in cfg.job_specs() {
            scheduler.submit(spec)?;
        }
        Ok(scheduler)
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Admit a job.
    ///
    /// The job goes straight to `Ready` when it has no prerequisites or all
    /// of them have completed; otherwise it waits in the blocked pool.
    /// Prerequisites must already be submitted.
    ///
    /// Errors (nothing is changed on error):
    /// - [`JobgateError::InvalidJob`] for an empty id,
    /// - [`JobgateError::DuplicateJob`] if the id is in use,
    /// - [`JobgateError::UnknownJob`] for an unknown prerequisite,
    /// - [`JobgateError::Cycle`] if the job lists itself.
    pub fn submit(&mut self, spec: JobSpec) -> Result<Admission> {
        let JobSpec {
            id,
            kind,
            priority,
            config,
            depends_on,
            edge_policy,
        } = spec;

        let job = Job::new(id, kind, priority, self.next_sequence, config)?;

        if self.index.contains_key(job.id()) {
            return Err(JobgateError::DuplicateJob(job.id().to_string()));
        }
        if depends_on.iter().any(|dep| dep == job.id()) {
            return Err(JobgateError::Cycle {
                job: job.id().to_string(),
                prerequisite: job.id().to_string(),
            });
        }
        let prerequisites = self.resolve_all(&depends_on)?;

        let key = job.key();
        let policy = edge_policy.unwrap_or(self.options.default_edge_policy);

        self.graph.add_job(key);
        if let Err(edge) = self.graph.add_dependency(key, &prerequisites, policy) {
            self.graph.remove_job(key);
            return Err(self.cycle_error(edge.job, edge.prerequisite, job.id()));
        }

        self.next_sequence += 1;
        self.index.insert(job.id().to_string(), key);
        let id = job.id().to_string();
        let sequence = job.sequence();
        self.jobs.insert(key, job);

        let state = if let Some(failed) = self.graph.failed_requirement(key) {
            let reason = format!("prerequisite '{}' failed", self.id_of(failed));
            warn!(job = %id, %reason, "admitted job can never run; failing it");
            self.state_manager().finish(key, JobOutcome::failed(reason));
            self.enforce_retention();
            JobState::Completed
        } else if self.graph.is_satisfied(key) {
            self.ready.push(priority, key);
            JobState::Ready
        } else {
            let outstanding = self.graph.outstanding_count(key);
            self.blocked.insert(key, outstanding);
            if let Some(job) = self.jobs.get_mut(&key) {
                job.set_state(JobState::Blocked);
            }
            JobState::Blocked
        };

        info!(job = %id, %priority, sequence, %state, "job admitted");

        Ok(Admission {
            id,
            sequence,
            state,
        })
    }

    /// Add prerequisites to an already submitted job, using the default
    /// edge policy. See [`Scheduler::add_dependency_with_policy`].
    pub fn add_dependency<I, S>(&mut self, id: &str, depends_on: I) -> Result<DependencyUpdate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let policy = self.options.default_edge_policy;
        self.add_dependency_with_policy(id, depends_on, policy)
    }

    /// Add prerequisites to an already submitted job.
    ///
    /// Allowed until the job is dispatched. A `Ready` job that gains an
    /// unmet prerequisite leaves the ready queue and goes back to the
    /// blocked pool; this is meant for the setup phase, before consumers
    /// start pulling jobs.
    ///
    /// If a new strict prerequisite had already failed, the job is failed
    /// on the spot and the returned step reports the cascade, including
    /// dependents of the job that became ready.
    pub fn add_dependency_with_policy<I, S>(
        &mut self,
        id: &str,
        depends_on: I,
        policy: EdgePolicy,
    ) -> Result<DependencyUpdate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = self.resolve(id)?;
        let names: Vec<String> = depends_on
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let prerequisites = self.resolve_all(&names)?;
        let state = self.state_by_key(key);

        if matches!(state, JobState::Dispatched | JobState::Completed) {
            return Err(self.transition_error(id, state, "add dependencies to"));
        }

        let added = self
            .graph
            .add_dependency(key, &prerequisites, policy)
            .map_err(|edge| self.cycle_error(edge.job, edge.prerequisite, id))?;

        let mut step = SchedulerStep::default();
        if let Some(failed) = added
            .iter()
            .copied()
            .find(|&p| self.graph.edge_doomed(p, policy))
        {
            let reason = format!("prerequisite '{}' failed", self.id_of(failed));
            warn!(job = %id, %reason, "new dependency already failed; failing job");
            step = self.state_manager().finish(key, JobOutcome::failed(reason));
            if !step.newly_ready.is_empty() {
                info!(job = %id, newly_ready = ?step.newly_ready, "dependents promoted");
            }
        } else if state == JobState::Blocked {
            let outstanding = added
                .iter()
                .filter(|&&p| !self.graph.is_completed(p))
                .count();
            self.blocked.add_outstanding(key, outstanding);
        } else if !self.graph.is_satisfied(key) {
            self.ready.remove(key);
            self.blocked.insert(key, self.graph.outstanding_count(key));
            if let Some(job) = self.jobs.get_mut(&key) {
                job.set_state(JobState::Blocked);
            }
            debug!(job = %id, "ready job gained unmet dependencies; marking Blocked");
        }

        debug!(job = %id, added = added.len(), "dependencies registered");
        let state = self.state_by_key(key);
        self.enforce_retention();
        Ok(DependencyUpdate { state, step })
    }

    /// Dispatch the highest-priority ready job, earliest submission first
    /// among equals. Never blocks; `None` when nothing is ready.
    pub fn next(&mut self) -> Option<Job> {
        let entry = self.ready.pop_min()?;
        let job = self.jobs.get_mut(&entry.key)?;
        job.set_state(JobState::Dispatched);
        debug!(
            job = %job.id(),
            kind = %job.kind(),
            priority = %job.priority(),
            sequence = job.sequence(),
            "job dispatched"
        );
        Some(job.clone())
    }

    /// The job `next()` would return, without dispatching it.
    pub fn peek(&self) -> Option<&Job> {
        self.ready
            .peek_min()
            .and_then(|entry| self.jobs.get(&entry.key))
    }

    /// Mark a job as successfully completed and promote its dependents.
    ///
    /// Completing an already-completed job is a no-op
    /// (`already_completed = true`). A `Ready` job may be completed without
    /// being dispatched; a `Blocked` job may not.
    pub fn complete(&mut self, id: &str) -> Result<SchedulerStep> {
        self.finish(id, JobOutcome::Succeeded)
    }

    /// Mark a job as completed with a failure.
    ///
    /// Dependents behind lenient edges are unblocked as usual; dependents
    /// behind `require_success` edges are failed, transitively.
    pub fn complete_failed(&mut self, id: &str, reason: impl Into<String>) -> Result<SchedulerStep> {
        self.finish(id, JobOutcome::failed(reason))
    }

    /// Drop a completed job from every structure. Its id may be reused
    /// afterwards, and later submissions can no longer depend on it.
    pub fn purge(&mut self, id: &str) -> Result<Job> {
        let key = self.resolve(id)?;
        let state = self.state_by_key(key);
        if state != JobState::Completed {
            return Err(self.transition_error(id, state, "purge"));
        }

        self.completed_order.retain(|&k| k != key);
        let job = self
            .remove_record(key)
            .ok_or_else(|| JobgateError::UnknownJob(id.to_string()))?;
        debug!(job = %id, "job purged");
        Ok(job)
    }

    /// Whether every prerequisite of `id` is satisfied.
    pub fn is_satisfied(&self, id: &str) -> Result<bool> {
        let key = self.resolve(id)?;
        Ok(self.graph.is_satisfied(key))
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.index.get(id).and_then(|key| self.jobs.get(key))
    }

    pub fn state_of(&self, id: &str) -> Option<JobState> {
        self.get(id).map(Job::state)
    }

    /// Ids of the direct prerequisites of `id`, in submission order.
    pub fn dependencies_of(&self, id: &str) -> Result<Vec<String>> {
        let key = self.resolve(id)?;
        let mut prerequisites: Vec<JobKey> = self
            .graph
            .prerequisites_of(key)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        prerequisites.sort();
        Ok(prerequisites.into_iter().map(|p| self.id_of(p)).collect())
    }

    /// All live jobs in submission order.
    pub fn jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by_key(|j| j.sequence());
        jobs
    }

    /// Ids of jobs still waiting on prerequisites, in submission order.
    pub fn blocked_ids(&self) -> Vec<String> {
        self.jobs()
            .into_iter()
            .filter(|j| j.state() == JobState::Blocked)
            .map(|j| j.id().to_string())
            .collect()
    }

    pub fn stats(&self) -> Stats {
        let ready = self.ready.len();
        let blocked = self.blocked.len();
        let completed = self.completed_order.len();
        let dispatched = self.jobs.len() - ready - blocked - completed;
        let failed = self
            .completed_order
            .iter()
            .filter_map(|key| self.jobs.get(key))
            .filter(|j| j.outcome().is_some_and(|o| !o.is_success()))
            .count();

        Stats {
            pending: ready + dispatched,
            ready,
            dispatched,
            blocked,
            completed,
            failed,
            next_priority: self.ready.peek_min().map(|entry| entry.priority),
        }
    }

    /// Number of live job records (any state).
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Nothing is ready and nothing is in flight, so no completion can
    /// arrive that would unblock the remaining jobs.
    pub fn is_quiescent(&self) -> bool {
        let stats = self.stats();
        stats.pending == 0
    }

    fn finish(&mut self, id: &str, outcome: JobOutcome) -> Result<SchedulerStep> {
        let key = self.resolve(id)?;
        let state = self.state_by_key(key);
        if state == JobState::Blocked {
            return Err(self.transition_error(id, state, "complete"));
        }

        let step = self.state_manager().finish(key, outcome);
        if step.already_completed {
            debug!(job = %id, "completion reported twice; ignoring");
        } else if !step.newly_ready.is_empty() {
            info!(job = %id, newly_ready = ?step.newly_ready, "dependents promoted");
        }
        self.enforce_retention();
        Ok(step)
    }

    fn state_manager(&mut self) -> StateManager<'_> {
        StateManager {
            jobs: &mut self.jobs,
            graph: &mut self.graph,
            blocked: &mut self.blocked,
            ready: &mut self.ready,
            completed_order: &mut self.completed_order,
        }
    }

    fn enforce_retention(&mut self) {
        let Retention::Latest(limit) = self.options.retention else {
            return;
        };
        while self.completed_order.len() > limit {
            let Some(key) = self.completed_order.pop_front() else {
                break;
            };
            if let Some(job) = self.remove_record(key) {
                debug!(job = %job.id(), limit, "evicted completed job");
            }
        }
    }

    fn remove_record(&mut self, key: JobKey) -> Option<Job> {
        let job = self.jobs.remove(&key)?;
        self.index.remove(job.id());
        self.graph.remove_job(key);
        Some(job)
    }

    fn resolve(&self, id: &str) -> Result<JobKey> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| JobgateError::UnknownJob(id.to_string()))
    }

    /// Resolve prerequisite ids, dropping duplicates but keeping order.
    fn resolve_all(&self, ids: &[String]) -> Result<Vec<JobKey>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(ids.len());
        for id in ids {
            let key = self.resolve(id)?;
            if seen.insert(key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn state_by_key(&self, key: JobKey) -> JobState {
        self.jobs
            .get(&key)
            .map(Job::state)
            .unwrap_or(JobState::Completed)
    }

    fn id_of(&self, key: JobKey) -> String {
        self.jobs
            .get(&key)
            .map(|j| j.id().to_string())
            .unwrap_or_default()
    }

    fn cycle_error(&self, job: JobKey, prerequisite: JobKey, fallback: &str) -> JobgateError {
        let job_id = self.jobs.get(&job).map_or(fallback.to_string(), |j| j.id().to_string());
        JobgateError::Cycle {
            job: job_id,
            prerequisite: self.id_of(prerequisite),
        }
    }

    fn transition_error(&self, id: &str, state: JobState, operation: &'static str) -> JobgateError {
        JobgateError::InvalidTransition {
            id: id.to_string(),
            state,
            operation,
        }
    }
}
