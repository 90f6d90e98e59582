use std::fmt;

use serde::Deserialize;

/// Lifecycle state of a job inside one scheduler instance.
///
/// Transitions move forward:
/// `Blocked -> Ready -> Dispatched -> Completed`. A job may skip ahead
/// (e.g. `Ready -> Completed` when the caller completes it without
/// dispatching, or `Blocked -> Completed` when a required prerequisite
/// failed). The only step back is `Ready -> Blocked`, when prerequisites
/// are added to a job that has not been dispatched yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Waiting on one or more prerequisites.
    Blocked,
    /// Eligible for dispatch; lives in the ready queue.
    Ready,
    /// Handed to a consumer via `next()`.
    Dispatched,
    /// Finished, successfully or not. See [`JobOutcome`].
    Completed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Blocked => "blocked",
            JobState::Ready => "ready",
            JobState::Dispatched => "dispatched",
            JobState::Completed => "completed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a completed job finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed { reason: String },
}

impl JobOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        JobOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }
}

/// Per-edge policy for a dependency.
///
/// - `require_success = false` (default): the prerequisite only has to
///   *complete*; a failed prerequisite unblocks its dependents like a
///   successful one.
/// - `require_success = true`: the dependent can only run if the
///   prerequisite succeeded. If it fails, the dependent is completed with a
///   failure outcome instead of ever becoming ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct EdgePolicy {
    #[serde(default)]
    pub require_success: bool,
}

impl EdgePolicy {
    pub const LENIENT: EdgePolicy = EdgePolicy {
        require_success: false,
    };
    pub const STRICT: EdgePolicy = EdgePolicy {
        require_success: true,
    };

    /// Whether a prerequisite that finished with `outcome` satisfies this edge.
    pub fn satisfied_by(self, outcome: &JobOutcome) -> bool {
        !self.require_success || outcome.is_success()
    }
}

/// How many completed job records the scheduler keeps around.
///
/// Completed ids are needed for dependency checks of later submissions, so
/// the default is to keep them forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    #[default]
    Unbounded,
    /// Keep at most this many completed records; the oldest completions are
    /// evicted first. An evicted id is unknown afterwards, so completing it
    /// again yields `UnknownJob` rather than a no-op.
    Latest(usize),
}
