// src/lib.rs

//! Dependency-gated priority job scheduler.
//!
//! Jobs are admitted with a priority and an optional set of prerequisites.
//! A job only becomes dispatchable once every prerequisite has completed;
//! ready jobs are dispatched by priority, earliest submission first within
//! a priority level.
//!
//! ```
//! use jobgate::dag::Scheduler;
//! use jobgate::job::{JobSpec, Priority};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.submit(JobSpec::new("extract", "extract"))?;
//! scheduler.submit(JobSpec::new("load", "load").after("extract").priority(Priority::HIGH))?;
//!
//! let job = scheduler.next().expect("extract is ready");
//! assert_eq!(job.id(), "extract");
//! assert!(scheduler.next().is_none());
//!
//! scheduler.complete("extract")?;
//! assert_eq!(scheduler.next().map(|j| j.id().to_string()), Some("load".to_string()));
//! # Ok::<(), jobgate::errors::JobgateError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod queue;
pub mod types;

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::JobFile;
use crate::dag::Scheduler;
use crate::engine::{Runtime, RuntimeOptions, SharedScheduler};
use crate::exec::LoggingExecutor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job-file loading
/// - scheduler admission
/// - worker runtime + executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let scheduler = Scheduler::from_config(&cfg)?;
    info!(jobs = scheduler.len(), path = %config_path.display(), "job file admitted");

    let options = RuntimeOptions {
        workers: args.workers.unwrap_or(cfg.scheduler.workers),
    };
    let runtime = Runtime::new(SharedScheduler::new(scheduler), LoggingExecutor::new(), options);

    // Ctrl-C → stop handing out jobs; in-flight jobs still report.
    {
        let cancel = runtime.cancel_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    let summary = runtime.run().await?;

    println!("succeeded: {}", summary.succeeded.len());
    println!("failed:    {}", summary.failed.len());
    for id in &summary.failed {
        println!("  - {id}");
    }
    if !summary.stranded.is_empty() {
        println!("stranded:  {}", summary.stranded.len());
        for id in &summary.stranded {
            println!("  - {id}");
        }
    }

    if !summary.is_clean() {
        bail!(
            "{} job(s) failed, {} job(s) never became ready",
            summary.failed.len(),
            summary.stranded.len()
        );
    }
    Ok(())
}

/// Dry-run output: the order a single worker would dispatch the jobs in,
/// assuming every job succeeds.
fn print_dry_run(cfg: &JobFile) -> Result<()> {
    println!("jobgate dry-run");
    println!("  scheduler.workers = {}", cfg.scheduler.workers);
    println!("  scheduler.require_success = {}", cfg.scheduler.require_success);
    if let Some(limit) = cfg.scheduler.retain_completed {
        println!("  scheduler.retain_completed = {limit}");
    }
    println!();

    let mut scheduler = Scheduler::from_config(cfg)?;
    println!("dispatch plan ({} jobs):", scheduler.len());

    let mut position = 1;
    while let Some(job) = scheduler.next() {
        println!(
            "  {position:>3}. {} (kind: {}, priority: {})",
            job.id(),
            job.kind(),
            job.priority()
        );
        if let Some(entry) = cfg.job.get(job.id()) {
            if !entry.after.is_empty() {
                println!("       after: {:?}", entry.after);
            }
        }
        scheduler.complete(job.id())?;
        position += 1;
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
