// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;

use crate::dag::state_manager::BlockedPool;
use crate::job::JobKey;
use crate::types::{EdgePolicy, JobOutcome};

/// An edge that was rejected because it would close a directed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleEdge {
    pub job: JobKey,
    pub prerequisite: JobKey,
}

/// Result of [`DependencyGraph::newly_unblocked`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Unblocked {
    /// Blocked jobs whose dependency set is now fully satisfied.
    pub ready: Vec<JobKey>,
    /// Blocked jobs that can never be satisfied because a `require_success`
    /// edge points at the prerequisite that just failed.
    pub doomed: Vec<JobKey>,
}

/// Prerequisite edges plus the completed set.
///
/// Edge direction is prerequisite -> dependent: for "B after A" we store
/// `A -> B`. Nodes are arena keys, never job records.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraphMap<JobKey, EdgePolicy>,
    completed: HashMap<JobKey, JobOutcome>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&mut self, job: JobKey) {
        self.graph.add_node(job);
    }

    /// Drop a job and every edge touching it.
    pub fn remove_job(&mut self, job: JobKey) {
        self.graph.remove_node(job);
        self.completed.remove(&job);
    }

    pub fn contains(&self, job: JobKey) -> bool {
        self.graph.contains_node(job)
    }

    /// Whether an edge `prerequisite -> job` would close a cycle.
    ///
    /// That happens exactly when `prerequisite` already (transitively)
    /// depends on `job`, i.e. there is a path `job -> ... -> prerequisite`.
    /// Depth-first search, O(V + E).
    pub fn would_cycle(&self, job: JobKey, prerequisite: JobKey) -> bool {
        job == prerequisite || has_path_connecting(&self.graph, job, prerequisite, None)
    }

    /// Register `job` as depending on every key in `prerequisites`.
    ///
    /// All edges are checked before any is inserted, so a rejected call
    /// leaves the graph untouched. Edges that already exist keep their
    /// original policy. Returns the prerequisites that were newly linked.
    ///
    /// Callers must make sure every key is already a node.
    pub fn add_dependency(
        &mut self,
        job: JobKey,
        prerequisites: &[JobKey],
        policy: EdgePolicy,
    ) -> Result<Vec<JobKey>, CycleEdge> {
        // Every new edge points *into* `job`, so any cycle they could form
        // must leave `job` through an existing edge. Checking each
        // prerequisite against the current graph is therefore enough.
        if let Some(&prerequisite) = prerequisites
            .iter()
            .find(|&&p| self.would_cycle(job, p))
        {
            return Err(CycleEdge { job, prerequisite });
        }

        let mut added = Vec::new();
        for &prerequisite in prerequisites {
            if self.graph.contains_edge(prerequisite, job) {
                continue;
            }
            self.graph.add_edge(prerequisite, job, policy);
            added.push(prerequisite);
        }
        Ok(added)
    }

    /// Direct prerequisites of `job` with the policy of each edge.
    pub fn prerequisites_of(&self, job: JobKey) -> Vec<(JobKey, EdgePolicy)> {
        self.graph
            .neighbors_directed(job, Direction::Incoming)
            .filter_map(|p| self.graph.edge_weight(p, job).map(|w| (p, *w)))
            .collect()
    }

    /// Direct dependents of `job` with the policy of each edge.
    pub fn dependents_of(&self, job: JobKey) -> Vec<(JobKey, EdgePolicy)> {
        self.graph
            .neighbors_directed(job, Direction::Outgoing)
            .filter_map(|d| self.graph.edge_weight(job, d).map(|w| (d, *w)))
            .collect()
    }

    /// Whether a single edge into a dependent is satisfied right now.
    pub fn edge_satisfied(&self, prerequisite: JobKey, policy: EdgePolicy) -> bool {
        self.completed
            .get(&prerequisite)
            .is_some_and(|outcome| policy.satisfied_by(outcome))
    }

    /// Whether a single edge can never be satisfied (strict edge, failed
    /// prerequisite).
    pub fn edge_doomed(&self, prerequisite: JobKey, policy: EdgePolicy) -> bool {
        self.completed
            .get(&prerequisite)
            .is_some_and(|outcome| !policy.satisfied_by(outcome))
    }

    /// True iff every prerequisite of `job` is completed (and succeeded,
    /// for `require_success` edges). No prerequisites means satisfied.
    pub fn is_satisfied(&self, job: JobKey) -> bool {
        self.prerequisites_of(job)
            .into_iter()
            .all(|(p, policy)| self.edge_satisfied(p, policy))
    }

    /// Number of prerequisites of `job` that have not completed yet.
    pub fn outstanding_count(&self, job: JobKey) -> usize {
        self.prerequisites_of(job)
            .into_iter()
            .filter(|(p, _)| !self.completed.contains_key(p))
            .count()
    }

    /// First prerequisite whose failure makes `job` impossible to satisfy.
    pub fn failed_requirement(&self, job: JobKey) -> Option<JobKey> {
        self.prerequisites_of(job)
            .into_iter()
            .find(|&(p, policy)| self.edge_doomed(p, policy))
            .map(|(p, _)| p)
    }

    /// Record `job` as completed. Idempotent: returns `false` (and keeps the
    /// first outcome) if it was already completed.
    pub fn mark_completed(&mut self, job: JobKey, outcome: JobOutcome) -> bool {
        if self.completed.contains_key(&job) {
            return false;
        }
        self.completed.insert(job, outcome);
        true
    }

    pub fn is_completed(&self, job: JobKey) -> bool {
        self.completed.contains_key(&job)
    }

    pub fn outcome_of(&self, job: JobKey) -> Option<&JobOutcome> {
        self.completed.get(&job)
    }

    /// After `job` was marked completed, settle its blocked dependents.
    ///
    /// Each dependent still in `blocked` has its outstanding count
    /// decremented; the ones reaching zero are removed from the pool and
    /// returned as `ready`. Dependents behind a strict edge of a failed
    /// `job` are removed and returned as `doomed`. Cost is O(out-degree)
    /// thanks to the per-job outstanding counts.
    pub fn newly_unblocked(&self, job: JobKey, blocked: &mut BlockedPool) -> Unblocked {
        let mut result = Unblocked::default();
        let Some(outcome) = self.completed.get(&job) else {
            return result;
        };

        for (dependent, policy) in self.dependents_of(job) {
            if !blocked.contains(dependent) {
                continue;
            }

            if !policy.satisfied_by(outcome) {
                blocked.remove(dependent);
                result.doomed.push(dependent);
            } else if blocked.settle_one(dependent) {
                result.ready.push(dependent);
            }
        }

        result.ready.sort();
        result.doomed.sort();
        result
    }
}
