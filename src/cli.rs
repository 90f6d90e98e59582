// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobgate",
    version,
    about = "Run prioritised jobs in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `JOBGATE_CONFIG`, else `Jobs.toml` in the current directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override `[scheduler].workers`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the dispatch plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
