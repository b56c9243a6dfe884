//! Six-phase documentation pipeline
//!
//! - **state**: the phase sequence and the run state machine
//! - **documents**: the document each phase produces
//! - **handoff**: durable per-phase artifacts
//! - **phase0..phase5**: one module per phase
//! - **render**: markdown output from the final document
//! - **workflow**: [`PhasePipeline`], which drives all of the above
//!
//! A phase takes its capability path when a provider is configured and its
//! local path otherwise. Either way it returns a document or an error; the
//! workflow alone decides whether that error halts the run.

pub mod documents;
pub mod handoff;
pub mod prompts;
pub mod render;
pub mod state;
pub mod workflow;

mod phase0_discovery;
mod phase1_file_analysis;
mod phase2_module_analysis;
mod phase3_synthesis;
mod phase4_examples;
mod phase5_faq;

pub use documents::{
    CodeExample, DiscoveryDocument, DocSection, ExamplesDocument, ExplorationReport, FaqDocument,
    FaqEntry, FileAnalysisSet, FinalDocument, ModuleAnalysisDocument, ModuleDetailSet,
    PhaseDocument,
};
pub use handoff::{HandoffStore, PhaseId};
pub use phase0_discovery::classify_file;
pub use state::{Phase, PipelineState};
pub use workflow::{PhasePipeline, PipelineReport};

use crate::config::DocsConfig;
use crate::coordinator::{ConcurrencyClass, ProgressFn, TaskCoordinator, TaskOutcome, WorkItem};
use crate::repo::RepositoryReader;
use anyhow::{Context, Result};
use docs_agent_sdk::{log_state_file, PipelineObserver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Everything a phase may touch
pub(crate) struct PhaseContext {
    pub config: DocsConfig,
    /// `None` means every phase runs locally
    pub coordinator: Option<TaskCoordinator>,
    pub observer: Arc<dyn PipelineObserver>,
    pub reader: Arc<dyn RepositoryReader>,
    pub store: HandoffStore,
}

impl PhaseContext {
    /// Fan `items` out under the cap configured for `class`
    pub async fn batch(
        &self,
        coordinator: &TaskCoordinator,
        class: ConcurrencyClass,
        items: Vec<WorkItem>,
    ) -> Vec<TaskOutcome> {
        let label = class.as_str();
        let progress: ProgressFn = Arc::new(move |completed, total| {
            debug!(class = label, completed, total, "Batch progress");
        });
        let items = items.into_iter().map(|item| item.with_class(class)).collect();
        coordinator
            .run_batch(items, class.cap(&self.config.limits), Some(progress))
            .await
    }

    /// Save a document and announce the artifact
    pub async fn persist<D: PhaseDocument>(
        &self,
        phase: Phase,
        document: &D,
        description: &str,
    ) -> Result<PathBuf> {
        let path = self
            .store
            .store(document)
            .await
            .with_context(|| format!("Failed to save {} artifact", D::ID))?;
        log_state_file!(self.observer, phase.index(), path.display(), description);
        Ok(path)
    }
}
