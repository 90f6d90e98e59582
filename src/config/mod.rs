// src/config/mod.rs

//! Job-file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a job file from disk (`loader.rs`).
//! - Validate references and acyclicity, and fix a submission order
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{JobEntry, JobFile, RawJobFile, SchedulerSection};
pub use validate::validate_config;
