//! Phase sequence and run state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    FileAnalysis,
    ModuleAnalysis,
    Synthesis,
    Examples,
    Faq,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Discovery,
        Phase::FileAnalysis,
        Phase::ModuleAnalysis,
        Phase::Synthesis,
        Phase::Examples,
        Phase::Faq,
    ];

    /// Zero-based position, as reported in pipeline events
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Discovery => "Discovery",
            Phase::FileAnalysis => "FileAnalysis",
            Phase::ModuleAnalysis => "ModuleAnalysis",
            Phase::Synthesis => "Synthesis",
            Phase::Examples => "Examples",
            Phase::Faq => "FAQ",
        }
    }

    /// Later phases need this phase's document; a failure halts the run
    pub fn is_load_bearing(self) -> bool {
        !matches!(self, Phase::Examples | Phase::Faq)
    }

    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a run is
///
/// `Done` and `Failed` are absorbing: no transition leaves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Running(Phase),
    Done,
    Failed { phase: Phase, cause: String },
}

impl PipelineState {
    pub fn start() -> Self {
        PipelineState::Running(Phase::Discovery)
    }

    pub fn current_phase(&self) -> Option<Phase> {
        match self {
            PipelineState::Running(phase) => Some(*phase),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::Running(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PipelineState::Done)
    }

    /// The current phase finished (completed or degraded)
    pub fn advance(self) -> Self {
        match self {
            PipelineState::Running(phase) => phase
                .next()
                .map(PipelineState::Running)
                .unwrap_or(PipelineState::Done),
            terminal => terminal,
        }
    }

    /// The current phase failed
    ///
    /// A load-bearing phase moves the run to `Failed`; any other phase takes
    /// the degrade path and the run moves on.
    pub fn fail(self, cause: impl Into<String>) -> Self {
        match self {
            PipelineState::Running(phase) if phase.is_load_bearing() => PipelineState::Failed {
                phase,
                cause: cause.into(),
            },
            running @ PipelineState::Running(_) => running.advance(),
            terminal => terminal,
        }
    }
}
