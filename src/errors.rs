// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Every scheduler operation validates its input before touching any state,
//! so an `Err` from this module always means "nothing changed".

use thiserror::Error;

use crate::types::JobState;

#[derive(Error, Debug)]
pub enum JobgateError {
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Duplicate job: {0}")]
    DuplicateJob(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Cycle detected: job '{job}' cannot depend on '{prerequisite}'")]
    Cycle { job: String, prerequisite: String },

    #[error("Cannot {operation} job '{id}' while it is {state}")]
    InvalidTransition {
        id: String,
        state: JobState,
        operation: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobgateError>;
