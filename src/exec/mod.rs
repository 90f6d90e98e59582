// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait the worker runtime
//!   talks to, and the `LoggingExecutor` used by the binary.

pub mod backend;

pub use backend::{ExecutorBackend, LoggingExecutor};
