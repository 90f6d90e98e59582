// src/dag/mod.rs

//! Dependency gating and the scheduler facade.
//!
//! - [`graph`] holds the prerequisite edges and the completed set, and
//!   decides eligibility.
//! - [`state_manager`] owns the blocked pool and applies completions,
//!   promotions and failure cascades.
//! - [`scheduler`] is the single entry point tying the graph, the blocked
//!   pool and the ready queue together.
//! - [`scheduler_step`] defines the result types of scheduler operations.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;

pub use graph::DependencyGraph;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use scheduler_step::{Admission, DependencyUpdate, SchedulerStep, Stats};
pub use state_manager::BlockedPool;
