// src/config/validate.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::{JobgateError, Result};

impl TryFrom<RawJobFile> for JobFile {
    type Error = crate::errors::JobgateError;

    fn try_from(raw: RawJobFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let order = submission_order(&raw);
        Ok(JobFile::new_unchecked(raw.scheduler, raw.job, order))
    }
}

/// Run every check on a raw job file without consuming it.
pub fn validate_config(cfg: &RawJobFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_scheduler_section(cfg)?;
    validate_job_entries(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawJobFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobgateError::ConfigError(
            "job file must contain at least one [job.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(cfg: &RawJobFile) -> Result<()> {
    // Priorities are strongly typed and checked during deserialization.
    if cfg.scheduler.workers == 0 {
        return Err(JobgateError::ConfigError(
            "[scheduler].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_entries(cfg: &RawJobFile) -> Result<()> {
    for id in cfg.job.keys() {
        if id.trim().is_empty() {
            return Err(JobgateError::InvalidJob(
                "job id must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawJobFile) -> Result<()> {
    for (id, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if dep == id {
                return Err(JobgateError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    id
                )));
            }
            if !cfg.job.contains_key(dep) {
                return Err(JobgateError::ConfigError(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    id, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawJobFile) -> Result<()> {
    // Edge direction: dep -> job
    // For:
    //   [job.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in cfg.job.keys() {
        graph.add_node(id.as_str());
    }

    for (id, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(JobgateError::Cycle {
                job: node.to_string(),
                prerequisite: cfg
                    .job
                    .get(node)
                    .and_then(|j| j.after.first().cloned())
                    .unwrap_or_else(|| node.to_string()),
            })
        }
    }
}

/// Kahn's algorithm over an acyclic job file, always taking the smallest
/// available id next so the order (and therefore sequence numbers) is
/// reproducible.
fn submission_order(cfg: &RawJobFile) -> Vec<String> {
    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (id, job) in cfg.job.iter() {
        let unique: BTreeSet<&str> = job.after.iter().map(String::as_str).collect();
        remaining.insert(id.as_str(), unique.len());
        for dep in unique {
            dependents.entry(dep).or_default().push(id.as_str());
        }
    }

    let mut available: BTreeSet<&str> = remaining
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut order = Vec::with_capacity(cfg.job.len());

    while let Some(id) = available.pop_first() {
        order.push(id.to_string());
        for &dependent in dependents.get(id).into_iter().flatten() {
            if let Some(count) = remaining.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    available.insert(dependent);
                }
            }
        }
    }

    order
}
