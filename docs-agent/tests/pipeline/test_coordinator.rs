//! Tests for batch execution through the task coordinator

use super::common::*;
use docs_agent::coordinator::{ProgressFn, TaskCoordinator, WorkItem};
use docs_agent::provider::WorkDescriptor;
use docs_agent_sdk::{NoopObserver, PipelineEvent, RecordingObserver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn items(count: usize) -> Vec<WorkItem> {
    (0..count)
        .map(|i| WorkItem::new(format!("item_{}", i), WorkDescriptor::text(format!("prompt {}", i))))
        .collect()
}

// ============================================================================
// Ordering and Concurrency Tests
// ============================================================================

#[tokio::test]
async fn test_batch_respects_cap_and_keeps_input_order() {
    let provider = Arc::new(ScriptedProvider::new().with_delay(Duration::from_millis(20)));
    let coordinator = TaskCoordinator::new(provider.clone(), Arc::new(NoopObserver));

    let outcomes = coordinator.run_batch(items(5), 2, None).await;

    assert!(provider.peak() <= 2, "peak in-flight was {}", provider.peak());
    assert_eq!(provider.calls(), 5);
    let names: Vec<&str> = outcomes.iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["item_0", "item_1", "item_2", "item_3", "item_4"]);
    assert!(outcomes.iter().all(|o| o.success()));
}

#[tokio::test]
async fn test_zero_cap_runs_one_at_a_time() {
    let provider = Arc::new(ScriptedProvider::new().with_delay(Duration::from_millis(5)));
    let coordinator = TaskCoordinator::new(provider.clone(), Arc::new(NoopObserver));

    let outcomes = coordinator.run_batch(items(3), 0, None).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(provider.peak(), 1);
}

#[tokio::test]
async fn test_empty_batch() {
    let coordinator = TaskCoordinator::new(Arc::new(ScriptedProvider::new()), Arc::new(NoopObserver));
    assert!(coordinator.run_batch(Vec::new(), 4, None).await.is_empty());
}

// ============================================================================
// Failure Isolation Tests
// ============================================================================

#[tokio::test]
async fn test_failure_is_isolated_to_its_item() {
    let provider = Arc::new(
        ScriptedProvider::new().failing_when(|work| work.prompt == "prompt 2"),
    );
    let coordinator = TaskCoordinator::new(provider, Arc::new(NoopObserver));

    let outcomes = coordinator.run_batch(items(4), 3, None).await;

    let successes: Vec<bool> = outcomes.iter().map(|o| o.success()).collect();
    assert_eq!(successes, vec![true, true, false, true]);
    assert!(outcomes[2].error().unwrap().contains("scripted outage"));
    assert!(outcomes[2].output().is_none());
}

#[tokio::test]
async fn test_slow_call_times_out() {
    let provider = Arc::new(ScriptedProvider::new().with_delay(Duration::from_millis(500)));
    let coordinator = TaskCoordinator::new(provider, Arc::new(NoopObserver))
        .with_timeout(Duration::from_millis(20));

    let outcome = coordinator
        .run_single(WorkItem::new("slow", WorkDescriptor::text("wait")))
        .await;

    assert!(!outcome.success());
    assert!(outcome.error().unwrap().contains("timed out"));
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

#[tokio::test]
async fn test_progress_counts_up_to_total() {
    let observer = Arc::new(RecordingObserver::new());
    let coordinator = TaskCoordinator::new(Arc::new(ScriptedProvider::new()), observer.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressFn = Arc::new(move |completed, total| {
        sink.lock().unwrap().push((completed, total));
    });

    coordinator.run_batch(items(4), 2, Some(progress)).await;

    assert_eq!(*seen.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    let batch_events = observer
        .events()
        .into_iter()
        .filter(|e| matches!(e, PipelineEvent::BatchProgress { .. }))
        .count();
    assert_eq!(batch_events, 4);
}
