// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::SchedulerOptions;
use crate::job::{JobConfig, JobSpec, Priority};
use crate::types::{EdgePolicy, Retention};

/// Job file as read from TOML, before validation.
///
/// ```toml
/// [scheduler]
/// workers = 4
/// require_success = false
///
/// [job.extract]
/// kind = "extract"
/// priority = "high"
///
/// [job.load]
/// kind = "load"
/// after = ["extract"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJobFile {
    /// Scheduler-wide settings from `[scheduler]`.
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// All jobs from `[job.<id>]`, keyed by job id.
    #[serde(default)]
    pub job: BTreeMap<String, JobEntry>,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Number of worker tasks pulling jobs when the file is run.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Default edge policy for `after` lists: when `true`, a failed
    /// prerequisite fails its dependents instead of unblocking them.
    #[serde(default)]
    pub require_success: bool,

    /// Keep at most this many completed jobs; unbounded when absent.
    #[serde(default)]
    pub retain_completed: Option<usize>,
}

fn default_workers() -> usize {
    4
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            require_success: false,
            retain_completed: None,
        }
    }
}

impl SchedulerSection {
    pub fn options(&self) -> SchedulerOptions {
        SchedulerOptions {
            default_edge_policy: EdgePolicy {
                require_success: self.require_success,
            },
            retention: self
                .retain_completed
                .map_or(Retention::Unbounded, Retention::Latest),
        }
    }
}

/// `[job.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    /// Free-form label handed to the executor (e.g. "extract").
    pub kind: String,

    /// Level name (`"high"`) or integer; defaults to normal.
    #[serde(default)]
    pub priority: Priority,

    /// Jobs that must complete before this one is dispatched.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-job override of `[scheduler].require_success`.
    #[serde(default)]
    pub require_success: Option<bool>,

    /// Opaque payload, passed through unmodified.
    #[serde(default)]
    pub config: JobConfig,
}

impl JobEntry {
    pub fn to_spec(&self, id: &str) -> JobSpec {
        let mut spec = JobSpec::new(id, self.kind.clone())
            .priority(self.priority)
            .after_all(self.after.iter().cloned())
            .config(self.config.clone());
        if let Some(require) = self.require_success {
            spec = spec.require_success(require);
        }
        spec
    }
}

/// A validated job file.
///
/// Only constructible through `TryFrom<RawJobFile>`, which checks that every
/// `after` reference exists and the dependency graph is acyclic, and fixes a
/// submission order in which prerequisites always come first.
#[derive(Debug, Clone)]
pub struct JobFile {
    pub scheduler: SchedulerSection,
    pub job: BTreeMap<String, JobEntry>,
    order: Vec<String>,
}

impl JobFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        job: BTreeMap<String, JobEntry>,
        order: Vec<String>,
    ) -> Self {
        Self {
            scheduler,
            job,
            order,
        }
    }

    /// Job ids in submission order (prerequisites first, ties by id).
    pub fn submission_order(&self) -> &[String] {
        &self.order
    }

    /// Submission requests in submission order.
    pub fn job_specs(&self) -> Vec<JobSpec> {
        self.order
            .iter()
            .filter_map(|id| self.job.get(id).map(|entry| entry.to_spec(id)))
            .collect()
    }
}
