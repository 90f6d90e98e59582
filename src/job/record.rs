// src/job/record.rs

//! The job record and the submission request that produces it.

use serde_json::{Map, Value};

use crate::errors::{JobgateError, Result};
use crate::job::priority::Priority;
use crate::types::{EdgePolicy, JobOutcome, JobState};

/// Opaque job payload, passed through to the executor unmodified.
pub type JobConfig = Map<String, Value>;

/// Arena key for a job inside one scheduler instance.
///
/// This is the job's submission sequence number, so it is unique, never
/// reused, and doubles as the FIFO tie-break inside a priority level.
/// The dependency graph, ready queue and blocked pool only ever hold keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobKey(u64);

impl JobKey {
    pub(crate) const fn from_sequence(sequence: u64) -> Self {
        JobKey(sequence)
    }

    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// One unit of work.
///
/// Identity (`id`, `kind`, `priority`, `sequence`, `config`) is fixed at
/// construction. Only the lifecycle state and outcome change, and only the
/// scheduler changes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: String,
    kind: String,
    priority: Priority,
    sequence: u64,
    config: JobConfig,
    state: JobState,
    outcome: Option<JobOutcome>,
}

impl Job {
    /// Build a job record in the `Ready` state.
    ///
    /// Fails with [`JobgateError::InvalidJob`] if `id` is empty or only
    /// whitespace.
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        priority: Priority,
        sequence: u64,
        config: JobConfig,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(JobgateError::InvalidJob(
                "job id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            kind: kind.into(),
            priority,
            sequence,
            config,
            state: JobState::Ready,
            outcome: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn key(&self) -> JobKey {
        JobKey::from_sequence(self.sequence)
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// `None` until the job is completed.
    pub fn outcome(&self) -> Option<&JobOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn set_state(&mut self, state: JobState) {
        self.state = state;
    }

    pub(crate) fn finish(&mut self, outcome: JobOutcome) {
        self.state = JobState::Completed;
        self.outcome = Some(outcome);
    }
}

/// Everything a caller supplies when submitting a job.
///
/// ```
/// use jobgate::job::{JobSpec, Priority};
///
/// let spec = JobSpec::new("load_users", "load")
///     .priority(Priority::HIGH)
///     .after("transform_users")
///     .with_config("target", "users.json");
/// assert_eq!(spec.depends_on, vec!["transform_users".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub id: String,
    pub kind: String,
    pub priority: Priority,
    pub config: JobConfig,
    /// Ids of jobs that must complete first. They must already be submitted.
    pub depends_on: Vec<String>,
    /// Edge policy for `depends_on`; `None` uses the scheduler default.
    pub edge_policy: Option<EdgePolicy>,
}

impl JobSpec {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            priority: Priority::default(),
            config: JobConfig::new(),
            depends_on: Vec::new(),
            edge_policy: None,
        }
    }

    pub fn priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn after(mut self, prerequisite: impl Into<String>) -> Self {
        self.depends_on.push(prerequisite.into());
        self
    }

    pub fn after_all<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on
            .extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn require_success(mut self, require: bool) -> Self {
        self.edge_policy = Some(EdgePolicy {
            require_success: require,
        });
        self
    }

    pub fn config(mut self, config: JobConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}
