// src/engine/mod.rs

//! Concurrent shell around the scheduler.
//!
//! The [`crate::dag::Scheduler`] is a synchronous, deterministic core with
//! no locks and no Tokio types. This module adds:
//! - [`shared`]: the single lock shared by producers and consumers, plus the
//!   cancellable blocking dispatch (`wait_next`)
//! - [`runtime`]: a pool of workers draining the scheduler through an
//!   [`crate::exec::ExecutorBackend`]

pub mod runtime;
pub mod shared;

pub use runtime::{RunSummary, Runtime, RuntimeOptions};
pub use shared::SharedScheduler;
