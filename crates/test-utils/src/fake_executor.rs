use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobgate::exec::ExecutorBackend;
use jobgate::job::Job;
use jobgate::types::JobOutcome;

/// A fake executor that:
/// - records which jobs were "run", in execution order
/// - fails the jobs whose ids were registered with `failing`
/// - otherwise reports success, optionally after a short delay.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            failing: HashSet::new(),
            delay: None,
        }
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute(&self, job: Job) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + '_>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(job.id().to_string());
            }

            if self.failing.contains(job.id()) {
                JobOutcome::failed(format!("{} failed on purpose", job.id()))
            } else {
                JobOutcome::Succeeded
            }
        })
    }
}
