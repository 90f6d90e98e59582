#![allow(dead_code)]

use std::collections::BTreeMap;

use jobgate::config::{JobEntry, JobFile, RawJobFile, SchedulerSection};
use jobgate::job::{JobConfig, Priority};

/// Builder for `JobFile` to simplify test setup.
pub struct JobFileBuilder {
    config: RawJobFile,
}

impl JobFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawJobFile {
                scheduler: SchedulerSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, id: &str, job: JobEntry) -> Self {
        self.config.job.insert(id.to_string(), job);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.scheduler.workers = workers;
        self
    }

    pub fn require_success(mut self, val: bool) -> Self {
        self.config.scheduler.require_success = val;
        self
    }

    pub fn retain_completed(mut self, limit: usize) -> Self {
        self.config.scheduler.retain_completed = Some(limit);
        self
    }

    pub fn build_raw(self) -> RawJobFile {
        self.config
    }

    pub fn build(self) -> JobFile {
        JobFile::try_from(self.config).expect("Failed to build valid job file from builder")
    }
}

impl Default for JobFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobEntry`.
pub struct JobEntryBuilder {
    job: JobEntry,
}

impl JobEntryBuilder {
    pub fn new(kind: &str) -> Self {
        Self {
            job: JobEntry {
                kind: kind.to_string(),
                priority: Priority::NORMAL,
                after: vec![],
                require_success: None,
                config: JobConfig::new(),
            },
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.job.priority = priority;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn require_success(mut self, val: bool) -> Self {
        self.job.require_success = Some(val);
        self
    }

    pub fn config(mut self, key: &str, value: serde_json::Value) -> Self {
        self.job.config.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> JobEntry {
        self.job
    }
}
