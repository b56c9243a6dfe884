//! Bounded-concurrency task coordinator
//!
//! - **task**: work items, concurrency classes and outcomes
//! - **batch**: ordered, non-fail-fast parallel execution
//!
//! The coordinator never returns an error for an individual item. Provider
//! failures, malformed output, timeouts and panics all become a failed
//! [`TaskOutcome`] for that item only.

pub mod batch;
pub mod task;

pub use batch::ProgressFn;
pub use task::{ConcurrencyClass, TaskOutcome, WorkItem};

use crate::error::ProviderError;
use crate::provider::CapabilityProvider;
use docs_agent_sdk::{log_task_complete, log_task_failed, log_task_start, PipelineObserver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct TaskCoordinator {
    provider: Arc<dyn CapabilityProvider>,
    observer: Arc<dyn PipelineObserver>,
    call_timeout: Duration,
}

impl TaskCoordinator {
    pub fn new(provider: Arc<dyn CapabilityProvider>, observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            provider,
            observer,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Run one item to completion
    ///
    /// Emits `task_started` and then either `task_completed` or
    /// `task_failed` through the observer.
    pub async fn run_single(&self, item: WorkItem) -> TaskOutcome {
        log_task_start!(self.observer, &item.name, item.class.as_str());
        debug!(task = %item.name, provider = self.provider.name(), "Invoking capability");

        let result = match tokio::time::timeout(
            self.call_timeout,
            self.provider.invoke(&item.descriptor),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                seconds: self.call_timeout.as_secs(),
            }),
        };

        match result {
            Ok(output) => {
                log_task_complete!(self.observer, &item.name, output.summary());
                TaskOutcome::succeeded(item.name, output)
            }
            Err(e) => {
                warn!(task = %item.name, error = %e, "Capability call failed");
                log_task_failed!(self.observer, &item.name, &e);
                TaskOutcome::failed(item.name, e)
            }
        }
    }
}
