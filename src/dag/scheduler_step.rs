// src/dag/scheduler_step.rs

//! Result types returned by scheduler operations.

use crate::job::Priority;
use crate::types::JobState;

/// What a completion (or a failure cascade) changed.
///
/// Callers use this to learn which jobs just became dispatchable and which
/// were failed because a required prerequisite failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Jobs promoted from `Blocked` to `Ready`, in key order.
    pub newly_ready: Vec<String>,
    /// Jobs newly completed with a failure outcome: the job that failed
    /// first, followed by any dependents failed in cascade.
    pub newly_failed: Vec<String>,
    /// The job was already completed; nothing changed.
    pub already_completed: bool,
}

/// Where a submitted job ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: String,
    /// Submission sequence number assigned to the job.
    pub sequence: u64,
    /// `Ready`, `Blocked`, or `Completed` when a required prerequisite had
    /// already failed.
    pub state: JobState,
}

/// Result of adding prerequisites to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyUpdate {
    /// State of the job afterwards.
    pub state: JobState,
    /// Knock-on effects. Non-empty only when a new strict prerequisite had
    /// already failed: the job is then failed too, and its own dependents
    /// are promoted or failed as if it had just completed.
    pub step: SchedulerStep,
}

/// Read-only snapshot of scheduler occupancy.
///
/// `pending` counts outstanding jobs that are no longer blocked (ready plus
/// dispatched), so `pending + blocked` always equals the number of live jobs
/// that have not completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub pending: usize,
    pub ready: usize,
    pub dispatched: usize,
    pub blocked: usize,
    pub completed: usize,
    pub failed: usize,
    /// Priority of the job `next()` would return.
    pub next_priority: Option<Priority>,
}
