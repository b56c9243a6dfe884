//! Parallel batch execution with concurrency control

use super::{TaskCoordinator, TaskOutcome, WorkItem};
use docs_agent_sdk::{PipelineEvent, PipelineObserver};
use futures::{stream::FuturesUnordered, FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Progress callback: `(completed, total)`, called once per finished item.
/// Runs inline in the completion loop, so it must return quickly and never
/// block; a slow callback stalls every item still in flight.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

impl TaskCoordinator {
    /// Run every item with at most `cap` provider calls in flight
    ///
    /// # Returns
    /// One outcome per input item, in input order (not completion order).
    ///
    /// # Error Handling
    /// Never fails fast: a failing or panicking item is recorded as a failed
    /// outcome and its siblings keep running. A `cap` of zero is treated as one.
    ///
    /// # Progress
    /// `progress` is invoked synchronously from the completion loop with a
    /// strictly increasing completed-count; order follows completion. It is
    /// never awaited, and like a [`PipelineObserver`] it must be non-blocking:
    /// items in flight make no progress while it runs.
    pub async fn run_batch(
        &self,
        items: Vec<WorkItem>,
        cap: usize,
        progress: Option<ProgressFn>,
    ) -> Vec<TaskOutcome> {
        let total = items.len();
        let sem = Semaphore::new(cap.max(1));
        let mut tasks = FuturesUnordered::new();

        // Push all tasks to FuturesUnordered with semaphore control
        for (idx, item) in items.into_iter().enumerate() {
            let sem = &sem;
            tasks.push(async move {
                let name = item.name.clone();

                // Acquire permit (waits while `cap` calls are in flight)
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, TaskOutcome::failed(name, "Semaphore closed")),
                };

                let outcome = AssertUnwindSafe(self.run_single(item))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| TaskOutcome::failed(name, "task panicked"));
                (idx, outcome)
            });
        }

        // Each outcome lands in its input slot; the slots are only touched here
        let mut slots: Vec<Option<TaskOutcome>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some((idx, outcome)) = tasks.next().await {
            slots[idx] = Some(outcome);
            completed += 1;

            self.observer.on_event(&PipelineEvent::BatchProgress { completed, total });
            if let Some(progress) = &progress {
                progress(completed, total);
            }
        }

        slots.into_iter().flatten().collect()
    }
}
