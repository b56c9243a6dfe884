//! Structured progress events for the docs-agent pipeline.
//!
//! The pipeline never writes progress to a global sink. Every component that
//! reports progress holds an `Arc<dyn PipelineObserver>` handed to it at
//! construction time, and emits [`PipelineEvent`]s through it. A wrapping UI
//! can subscribe with [`BroadcastObserver`], a CLI uses [`StderrObserver`]
//! (one `__DOCS_EVENT__:<json>` line per event), and tests use
//! [`RecordingObserver`] or [`NoopObserver`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Prefix written in front of every serialized event on stderr
pub const EVENT_PREFIX: &str = "__DOCS_EVENT__:";

/// Status of one pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    NotStarted,
    Running,
    Completed,
    /// Non-fatal failure: the phase contributed an empty result
    Degraded,
    Failed,
}

impl PhaseStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Degraded | Self::Failed)
    }
}

/// Structured events emitted while a pipeline run is in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        run_id: Uuid,
        repository: String,
        started_at: DateTime<Utc>,
    },
    PhaseStarted {
        phase: usize,
        name: String,
        total_phases: usize,
    },
    PhaseCompleted {
        phase: usize,
        name: String,
    },
    /// Phase failed but the run continues with an empty contribution
    PhaseDegraded {
        phase: usize,
        name: String,
        reason: String,
    },
    PhaseFailed {
        phase: usize,
        name: String,
        error: String,
    },
    TaskStarted {
        task_id: String,
        description: String,
    },
    TaskCompleted {
        task_id: String,
        result: Option<String>,
    },
    TaskFailed {
        task_id: String,
        error: String,
    },
    /// One more item of a batch finished; `completed` only grows
    BatchProgress {
        completed: usize,
        total: usize,
    },
    StateFileCreated {
        phase: usize,
        file_path: String,
        description: String,
    },
    /// Free-form note worth surfacing (counts, detected frameworks, fallbacks)
    Finding {
        phase: usize,
        message: String,
    },
    RunFinished {
        run_id: Uuid,
        succeeded: bool,
        failed_phase: Option<String>,
        finished_at: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// Emit this event to stderr for a wrapping process to parse
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("{}{}", EVENT_PREFIX, json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse a line previously written by [`PipelineEvent::emit`]
    pub fn parse_line(line: &str) -> Option<Self> {
        let json = line.trim().strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }
}

/// Receives pipeline events. Implementations must be cheap and non-blocking:
/// they are called from inside the task coordinator's completion loop.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

impl<T: PipelineObserver + ?Sized> PipelineObserver for Arc<T> {
    fn on_event(&self, event: &PipelineEvent) {
        (**self).on_event(event)
    }
}

impl<T: PipelineObserver + ?Sized> PipelineObserver for &T {
    fn on_event(&self, event: &PipelineEvent) {
        (**self).on_event(event)
    }
}

/// Writes every event to stderr with [`EVENT_PREFIX`]
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrObserver;

impl PipelineObserver for StderrObserver {
    fn on_event(&self, event: &PipelineEvent) {
        event.emit();
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory, in the order received
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Names of phases that reported the given terminal status
    pub fn phases_with(&self, status: PhaseStatus) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match (status, event) {
                (PhaseStatus::Completed, PipelineEvent::PhaseCompleted { name, .. })
                | (PhaseStatus::Degraded, PipelineEvent::PhaseDegraded { name, .. })
                | (PhaseStatus::Failed, PipelineEvent::PhaseFailed { name, .. })
                | (PhaseStatus::Running, PipelineEvent::PhaseStarted { name, .. }) => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<PipelineEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<PipelineEvent>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }
}

impl PipelineObserver for BroadcastObserver {
    fn on_event(&self, event: &PipelineEvent) {
        // No receivers is not an error for the pipeline
        let _ = self.tx.send(event.clone());
    }
}

/// Helper macros for pipeline logging through an observer
#[macro_export]
macro_rules! log_phase_start {
    ($observer:expr, $phase:expr, $name:expr, $total:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::PhaseStarted {
            phase: $phase,
            name: $name.to_string(),
            total_phases: $total,
        })
    };
}

#[macro_export]
macro_rules! log_phase_complete {
    ($observer:expr, $phase:expr, $name:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::PhaseCompleted {
            phase: $phase,
            name: $name.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_phase_degraded {
    ($observer:expr, $phase:expr, $name:expr, $reason:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::PhaseDegraded {
            phase: $phase,
            name: $name.to_string(),
            reason: $reason.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_phase_failed {
    ($observer:expr, $phase:expr, $name:expr, $error:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::PhaseFailed {
            phase: $phase,
            name: $name.to_string(),
            error: $error.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($observer:expr, $task_id:expr, $desc:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::TaskStarted {
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($observer:expr, $task_id:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::TaskCompleted {
            task_id: $task_id.to_string(),
            result: None,
        })
    };
    ($observer:expr, $task_id:expr, $result:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::TaskCompleted {
            task_id: $task_id.to_string(),
            result: Some($result.to_string()),
        })
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($observer:expr, $task_id:expr, $error:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_state_file {
    ($observer:expr, $phase:expr, $path:expr, $desc:expr) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::StateFileCreated {
            phase: $phase,
            file_path: $path.to_string(),
            description: $desc.to_string(),
        })
    };
}

#[macro_export]
macro_rules! log_finding {
    ($observer:expr, $phase:expr, $($arg:tt)+) => {
        $crate::PipelineObserver::on_event(&$observer, &$crate::PipelineEvent::Finding {
            phase: $phase,
            message: format!($($arg)+),
        })
    };
}
