// tests/shared_scheduler.rs

mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{TestResult, init_tracing, spec, with_timeout};
use jobgate::dag::Scheduler;
use jobgate::engine::SharedScheduler;
use jobgate::job::Priority;
use jobgate::types::{EdgePolicy, JobState};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn wait_next_returns_immediately_when_a_job_is_ready() -> TestResult {
    init_tracing();
    let shared = SharedScheduler::new(Scheduler::new());
    shared.submit(spec("ready", Priority::NORMAL))?;

    let cancel = CancellationToken::new();
    let job = with_timeout(shared.wait_next(&cancel)).await;
    assert_eq!(job.map(|j| j.id().to_string()).as_deref(), Some("ready"));
    Ok(())
}

#[tokio::test]
async fn wait_next_wakes_when_a_completion_unblocks_a_job() -> TestResult {
    init_tracing();
    let shared = SharedScheduler::new(Scheduler::new());
    shared.submit(spec("extract", Priority::NORMAL))?;
    shared.submit(spec("load", Priority::NORMAL).after("extract"))?;

    let extract = shared.next().ok_or("extract should be ready")?;
    let cancel = CancellationToken::new();

    let consumer = {
        let shared = shared.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { shared.wait_next(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished(), "load is still gated");

    shared.complete(extract.id())?;
    let job = with_timeout(consumer).await?;
    assert_eq!(job.map(|j| j.id().to_string()).as_deref(), Some("load"));
    Ok(())
}

#[tokio::test]
async fn wait_next_wakes_on_submission() -> TestResult {
    let shared = SharedScheduler::new(Scheduler::new());
    let cancel = CancellationToken::new();

    let consumer = {
        let shared = shared.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { shared.wait_next(&cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    shared.submit(spec("late", Priority::LOW))?;

    let job = with_timeout(consumer).await?;
    assert_eq!(job.map(|j| j.id().to_string()).as_deref(), Some("late"));
    Ok(())
}

#[tokio::test]
async fn cancellation_releases_blocked_consumers() -> TestResult {
    let shared = SharedScheduler::new(Scheduler::new());
    let cancel = CancellationToken::new();

    let mut consumers = JoinSet::new();
    for _ in 0..3 {
        let shared = shared.clone();
        let cancel = cancel.clone();
        consumers.spawn(async move { shared.wait_next(&cancel).await });
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let results = with_timeout(consumers.join_all()).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Option::is_none));
    Ok(())
}

#[tokio::test]
async fn already_cancelled_token_returns_none_even_with_work() -> TestResult {
    let shared = SharedScheduler::new(Scheduler::new());
    shared.submit(spec("a", Priority::NORMAL))?;

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(shared.wait_next(&cancel).await.is_none());
    assert_eq!(shared.stats().ready, 1, "cancelled wait must not dispatch");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumers_never_receive_the_same_job() -> TestResult {
    init_tracing();
    let shared = SharedScheduler::new(Scheduler::new());
    for i in 0..200 {
        shared.submit(spec(&format!("job-{i}"), Priority::new(i % 5)))?;
    }

    let mut consumers = JoinSet::new();
    for _ in 0..8 {
        let shared = shared.clone();
        consumers.spawn(async move {
            let mut taken = Vec::new();
            while let Some(job) = shared.next() {
                taken.push(job.id().to_string());
                tokio::task::yield_now().await;
            }
            taken
        });
    }

    let taken: Vec<String> = with_timeout(consumers.join_all())
        .await
        .into_iter()
        .flatten()
        .collect();
    let unique: HashSet<&String> = taken.iter().collect();
    assert_eq!(taken.len(), 200);
    assert_eq!(unique.len(), 200);
    assert_eq!(shared.stats().dispatched, 200);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn producers_and_consumers_share_one_scheduler() -> TestResult {
    let shared = SharedScheduler::new(Scheduler::new());
    let cancel = CancellationToken::new();

    let mut consumers = JoinSet::new();
    for _ in 0..4 {
        let shared = shared.clone();
        let cancel = cancel.clone();
        consumers.spawn(async move {
            let mut done = 0usize;
            while let Some(job) = shared.wait_next(&cancel).await {
                shared.complete(job.id()).expect("dispatched job completes");
                done += 1;
            }
            done
        });
    }

    let producer = {
        let shared = shared.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                let id = format!("step-{i}");
                let job = if i == 0 {
                    spec(&id, Priority::NORMAL)
                } else {
                    spec(&id, Priority::NORMAL).after(format!("step-{}", i - 1))
                };
                shared.submit(job).expect("submission succeeds");
            }
        })
    };
    producer.await?;

    with_timeout(async {
        while shared.stats().completed < 50 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    cancel.cancel();

    let total: usize = with_timeout(consumers.join_all()).await.into_iter().sum();
    assert_eq!(total, 50);
    assert!(shared.is_quiescent());
    Ok(())
}

#[tokio::test]
async fn failing_a_job_through_add_dependency_wakes_consumers() -> TestResult {
    init_tracing();
    let shared = SharedScheduler::new(Scheduler::new());
    shared.submit(spec("F", Priority::NORMAL))?;
    shared.submit(spec("G", Priority::NORMAL))?;
    shared.submit(spec("X", Priority::NORMAL).after("G"))?;
    shared.submit(spec("D", Priority::NORMAL).after("X"))?;

    // Take the ready jobs out so the consumer has to park.
    let f = shared.next().ok_or("F should be ready")?;
    let g = shared.next().ok_or("G should be ready")?;
    shared.complete_failed(f.id(), "bad input")?;

    let cancel = CancellationToken::new();
    let consumer = {
        let shared = shared.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { shared.wait_next(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished(), "nothing is ready yet");

    let update = shared.add_dependency_with_policy("X", ["F"], EdgePolicy::STRICT)?;
    assert_eq!(update.state, JobState::Completed);
    assert_eq!(update.step.newly_ready, vec!["D"]);

    let job = with_timeout(consumer).await?;
    assert_eq!(job.map(|j| j.id().to_string()).as_deref(), Some("D"));
    assert_eq!(shared.state_of(g.id()), Some(JobState::Dispatched));
    Ok(())
}
