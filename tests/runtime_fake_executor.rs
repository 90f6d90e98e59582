// tests/runtime_fake_executor.rs

mod common;
use crate::common::builders::{JobEntryBuilder, JobFileBuilder};
use crate::common::fake_executor::FakeExecutor;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobgate::config::JobFile;
use jobgate::dag::Scheduler;
use jobgate::engine::{Runtime, RuntimeOptions, SharedScheduler};
use jobgate::job::Priority;
use jobgate::types::JobState;

/// extract -> transform -> load, plus an independent audit job.
fn pipeline_config(require_success: bool) -> JobFile {
    JobFileBuilder::new()
        .require_success(require_success)
        .with_job(
            "z_extract",
            JobEntryBuilder::new("extract")
                .priority(Priority::HIGH)
                .config("source", serde_json::json!("orders.csv"))
                .build(),
        )
        .with_job(
            "m_transform",
            JobEntryBuilder::new("transform").after("z_extract").build(),
        )
        .with_job(
            "a_load",
            JobEntryBuilder::new("load").after("m_transform").build(),
        )
        .with_job("b_audit", JobEntryBuilder::new("audit").build())
        .build()
}

fn runtime_for(
    cfg: &JobFile,
    executor: FakeExecutor,
    workers: usize,
) -> Result<(SharedScheduler, Runtime<FakeExecutor>), Box<dyn std::error::Error>> {
    let shared = SharedScheduler::new(Scheduler::from_config(cfg)?);
    let runtime = Runtime::new(shared.clone(), executor, RuntimeOptions { workers });
    Ok((shared, runtime))
}

#[tokio::test]
async fn single_worker_runs_jobs_in_dependency_and_priority_order() -> TestResult {
    init_tracing();
    let executed = Arc::new(Mutex::new(Vec::new()));
    let (shared, runtime) = runtime_for(
        &pipeline_config(false),
        FakeExecutor::new(Arc::clone(&executed)),
        1,
    )?;

    let summary = with_timeout(runtime.run()).await?;

    let executed = executed.lock().unwrap().clone();
    assert_eq!(executed, vec!["z_extract", "b_audit", "m_transform", "a_load"]);
    assert_eq!(summary.succeeded, executed);
    assert!(summary.is_clean());
    assert_eq!(shared.stats().completed, 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_respects_dependencies() -> TestResult {
    init_tracing();
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(Arc::clone(&executed)).with_delay(Duration::from_millis(5));
    let (shared, runtime) = runtime_for(&pipeline_config(false), executor, 4)?;

    let summary = with_timeout(runtime.run()).await?;
    assert!(summary.is_clean());
    assert_eq!(summary.succeeded.len(), 4);

    let executed = executed.lock().unwrap().clone();
    let position = |id: &str| executed.iter().position(|e| e == id).unwrap();
    assert!(position("z_extract") < position("m_transform"));
    assert!(position("m_transform") < position("a_load"));
    assert!(shared.is_quiescent());
    Ok(())
}

#[tokio::test]
async fn lenient_failure_still_runs_dependents() -> TestResult {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(Arc::clone(&executed)).failing("z_extract");
    let (shared, runtime) = runtime_for(&pipeline_config(false), executor, 1)?;

    let summary = with_timeout(runtime.run()).await?;

    assert_eq!(summary.failed, vec!["z_extract"]);
    assert_eq!(summary.succeeded.len(), 3);
    assert!(!summary.is_clean());
    assert_eq!(shared.stats().failed, 1);
    Ok(())
}

#[tokio::test]
async fn required_success_fails_downstream_without_running_it() -> TestResult {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(Arc::clone(&executed)).failing("z_extract");
    let (shared, runtime) = runtime_for(&pipeline_config(true), executor, 2)?;

    let summary = with_timeout(runtime.run()).await?;

    let mut executed = executed.lock().unwrap().clone();
    executed.sort();
    assert_eq!(executed, vec!["b_audit", "z_extract"]);
    assert_eq!(summary.failed, vec!["z_extract", "m_transform", "a_load"]);
    assert_eq!(summary.succeeded, vec!["b_audit"]);
    assert!(summary.stranded.is_empty());
    assert_eq!(shared.state_of("a_load"), Some(JobState::Completed));
    Ok(())
}

#[tokio::test]
async fn cancelled_run_reports_stranded_jobs() -> TestResult {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let (shared, runtime) = runtime_for(
        &pipeline_config(false),
        FakeExecutor::new(Arc::clone(&executed)),
        2,
    )?;

    runtime.cancel_token().cancel();
    let summary = with_timeout(runtime.run()).await?;

    assert!(executed.lock().unwrap().is_empty());
    assert_eq!(summary.stranded, vec!["m_transform", "a_load"]);
    assert_eq!(shared.stats().ready, 2);
    Ok(())
}

#[tokio::test]
async fn run_with_nothing_to_do_returns_immediately() -> TestResult {
    let shared = SharedScheduler::new(Scheduler::new());
    let executed = Arc::new(Mutex::new(Vec::new()));
    let runtime = Runtime::new(
        shared,
        FakeExecutor::new(executed),
        RuntimeOptions::default(),
    );

    let summary = with_timeout(runtime.run()).await?;
    assert_eq!(summary, Default::default());
    Ok(())
}
