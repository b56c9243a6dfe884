// Shared data records (files, modules, edges)
pub mod types;

// Error taxonomy
pub mod error;

// Runtime configuration
pub mod config;

// tracing subscriber setup
pub mod logging;

// YAML extraction and parsing helpers
pub mod yaml;

// Repository reading and walking
pub mod repo;

// Capability provider boundary
pub mod provider;

// Bounded-concurrency task coordinator
pub mod coordinator;

// Pattern-based source extraction
pub mod analysis;

// Module grouping and dependency edges
pub mod graph;

// Phase pipeline, handoff store and rendering
pub mod pipeline;

// Command-line arguments
pub mod cli;

pub use config::{ConcurrencyLimits, DocsConfig};
pub use coordinator::{TaskCoordinator, TaskOutcome, WorkItem};
pub use error::{HandoffError, PhaseFailure, ProviderError, ReadError};
pub use pipeline::{PhasePipeline, PipelineReport, PipelineState};
