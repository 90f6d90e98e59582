// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (unknown references, cycles, etc.). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse job-file TOML from a string.
pub fn parse_str(contents: &str) -> Result<RawJobFile> {
    let config: RawJobFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a job file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown `after` references,
///   - dependency cycles,
///   - basic `[scheduler]` sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw_config = load_from_path(&path)?;
    let config = JobFile::try_from(raw_config)?;
    Ok(config)
}

/// Default job file path: `Jobs.toml` in the current working directory,
/// unless `JOBGATE_CONFIG` is set.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("JOBGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Jobs.toml"))
}
