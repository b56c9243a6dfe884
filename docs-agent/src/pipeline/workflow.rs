//! Pipeline orchestration
//!
//! [`PhasePipeline::run`] walks the [`PipelineState`] machine from Discovery
//! to a terminal state. Each phase is announced through the observer, its
//! document is saved to the handoff store, and its error (if any) is routed
//! through [`PipelineState::fail`]: load-bearing phases halt the run, the
//! rest degrade to an empty contribution.
//!
//! ```no_run
//! use docs_agent::{DocsConfig, PhasePipeline};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = DocsConfig {
//!     offline: true,
//!     ..DocsConfig::for_repository("./my-project")
//! };
//! let report = PhasePipeline::new(config)?.run().await?;
//! assert!(report.succeeded());
//! # Ok(())
//! # }
//! ```

use super::documents::{
    DiscoveryDocument, ExamplesDocument, FaqDocument, FileAnalysisSet, FinalDocument,
    ModuleAnalysisDocument,
};
use super::handoff::{HandoffStore, PhaseId};
use super::state::{Phase, PipelineState};
use super::{
    phase0_discovery, phase1_file_analysis, phase2_module_analysis, phase3_synthesis,
    phase4_examples, phase5_faq, render, PhaseContext,
};
use crate::config::DocsConfig;
use crate::coordinator::TaskCoordinator;
use crate::error::PhaseFailure;
use crate::provider::{CapabilityProvider, MessagesApiProvider};
use crate::repo::{FsRepository, RepositoryReader};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use docs_agent_sdk::{
    log_finding, log_phase_complete, log_phase_degraded, log_phase_failed, log_phase_start,
    log_state_file, NoopObserver, PhaseStatus, PipelineEvent, PipelineObserver,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of one [`PhasePipeline::run`]
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    /// `Done` or `Failed`
    pub state: PipelineState,
    /// Every phase that started, with how it finished
    pub phases: Vec<(Phase, PhaseStatus)>,
    /// Present when the run reached `Done`
    pub final_document: Option<FinalDocument>,
    pub output_dir: PathBuf,
    /// Rendered markdown files
    pub rendered: Vec<PathBuf>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.state.is_done()
    }

    pub fn failure(&self) -> Option<PhaseFailure> {
        match &self.state {
            PipelineState::Failed { phase, cause } => Some(PhaseFailure {
                phase: *phase,
                cause: cause.clone(),
            }),
            _ => None,
        }
    }

    pub fn status_of(&self, phase: Phase) -> PhaseStatus {
        self.phases
            .iter()
            .find(|(p, _)| *p == phase)
            .map_or(PhaseStatus::NotStarted, |(_, status)| *status)
    }
}

/// Documents produced so far in a run
#[derive(Default)]
struct RunArtifacts {
    discovery: Option<DiscoveryDocument>,
    files: Option<FileAnalysisSet>,
    modules: Option<ModuleAnalysisDocument>,
    synthesis: Option<FinalDocument>,
    examples: ExamplesDocument,
    faq: FaqDocument,
    degraded: Vec<Phase>,
}

/// Upstream document, present whenever the state machine reached `phase`
fn upstream<'a, T>(doc: &'a Option<T>, phase: Phase) -> Result<&'a T> {
    doc.as_ref()
        .ok_or_else(|| anyhow!("{} ran before its inputs were produced", phase))
}

pub struct PhasePipeline {
    config: DocsConfig,
    provider: Option<Arc<dyn CapabilityProvider>>,
    observer: Arc<dyn PipelineObserver>,
    reader: Arc<dyn RepositoryReader>,
}

impl PhasePipeline {
    /// Filesystem reader over `config.repository`, no observer, and the
    /// messages API provider when the config has a key and is not offline
    pub fn new(config: DocsConfig) -> Result<Self> {
        let provider: Option<Arc<dyn CapabilityProvider>> = if config.wants_provider() {
            let provider = MessagesApiProvider::new(
                &config.endpoint,
                &config.model,
                config.api_key.clone().unwrap_or_default(),
                config.call_timeout,
            )
            .context("Failed to configure capability provider")?;
            Some(Arc::new(provider))
        } else {
            None
        };
        let reader = Arc::new(FsRepository::new(&config.repository, config.max_file_bytes));

        Ok(Self {
            config,
            provider,
            observer: Arc::new(NoopObserver),
            reader,
        })
    }

    /// Replace the provider; ignored when the config is offline
    pub fn with_provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn RepositoryReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    fn context(&self) -> PhaseContext {
        let coordinator = match &self.provider {
            Some(provider) if !self.config.offline => Some(
                TaskCoordinator::new(provider.clone(), self.observer.clone())
                    .with_timeout(self.config.call_timeout),
            ),
            _ => None,
        };
        PhaseContext {
            config: self.config.clone(),
            coordinator,
            observer: self.observer.clone(),
            reader: self.reader.clone(),
            store: HandoffStore::new(self.config.handoff_dir()),
        }
    }

    /// Run every phase from scratch
    ///
    /// A halted run is still `Ok`: the report's state is `Failed` with the
    /// phase and cause. `Err` is reserved for the handoff directory or the
    /// output directory being unusable.
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let ctx = self.context();
        let total = Phase::ALL.len();

        ctx.store
            .reset()
            .await
            .context("Failed to prepare handoff directory")?;

        info!(
            %run_id,
            repository = %self.config.repository.display(),
            online = ctx.coordinator.is_some(),
            "Starting documentation run"
        );
        self.observer.on_event(&PipelineEvent::RunStarted {
            run_id,
            repository: self.config.repository.display().to_string(),
            started_at: Utc::now(),
        });

        let mut state = PipelineState::start();
        let mut statuses = Vec::with_capacity(total);
        let mut artifacts = RunArtifacts::default();

        while let Some(phase) = state.current_phase() {
            log_phase_start!(self.observer, phase.index(), phase.name(), total);
            info!("Phase {}/{}: {}", phase.index() + 1, total, phase);

            state = match self.run_phase(&ctx, phase, &mut artifacts).await {
                Ok(()) => {
                    log_phase_complete!(self.observer, phase.index(), phase.name());
                    statuses.push((phase, PhaseStatus::Completed));
                    state.advance()
                }
                Err(e) if phase.is_load_bearing() => {
                    let failure = PhaseFailure::new(phase, &e);
                    error!(phase = %phase, cause = %failure.cause, "Phase failed, halting run");
                    log_phase_failed!(self.observer, phase.index(), phase.name(), &failure.cause);
                    statuses.push((phase, PhaseStatus::Failed));
                    state.fail(failure.cause)
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!(phase = %phase, reason = %reason, "Phase degraded to an empty result");
                    log_phase_degraded!(self.observer, phase.index(), phase.name(), &reason);
                    statuses.push((phase, PhaseStatus::Degraded));
                    self.substitute_empty(&ctx, phase, &mut artifacts).await?;
                    state.fail(reason)
                }
            };
        }

        let mut final_document = None;
        let mut rendered = Vec::new();
        if state.is_done() {
            let document = self.assemble(&ctx, &mut artifacts).await?;
            rendered = render::render(&document, &self.config.output_dir).await?;
            log_finding!(
                self.observer,
                Phase::Faq.index(),
                "Rendered {} documentation files to {}",
                rendered.len(),
                self.config.output_dir.display()
            );
            final_document = Some(document);
        }

        let failed_phase = match &state {
            PipelineState::Failed { phase, .. } => Some(phase.name().to_string()),
            _ => None,
        };
        self.observer.on_event(&PipelineEvent::RunFinished {
            run_id,
            succeeded: state.is_done(),
            failed_phase,
            finished_at: Utc::now(),
        });
        info!(%run_id, state = ?state, "Documentation run finished");

        Ok(PipelineReport {
            run_id,
            state,
            phases: statuses,
            final_document,
            output_dir: self.config.output_dir.clone(),
            rendered,
        })
    }

    async fn run_phase(
        &self,
        ctx: &PhaseContext,
        phase: Phase,
        artifacts: &mut RunArtifacts,
    ) -> Result<()> {
        match phase {
            Phase::Discovery => {
                let doc = phase0_discovery::discover(ctx).await?;
                ctx.persist(phase, &doc, "Repository discovery").await?;
                artifacts.discovery = Some(doc);
            }
            Phase::FileAnalysis => {
                let discovery = upstream(&artifacts.discovery, phase)?;
                let doc = phase1_file_analysis::analyze_files(ctx, discovery).await?;
                ctx.persist(phase, &doc, "Per-file analysis records").await?;
                artifacts.files = Some(doc);
            }
            Phase::ModuleAnalysis => {
                let discovery = upstream(&artifacts.discovery, phase)?;
                let files = upstream(&artifacts.files, phase)?;
                let doc = phase2_module_analysis::analyze_modules(ctx, discovery, files).await?;
                ctx.persist(phase, &doc, "Modules and dependency graph").await?;
                artifacts.modules = Some(doc);
            }
            Phase::Synthesis => {
                let doc = phase3_synthesis::synthesize(
                    ctx,
                    upstream(&artifacts.discovery, phase)?,
                    upstream(&artifacts.files, phase)?,
                    upstream(&artifacts.modules, phase)?,
                )
                .await?;
                let path = ctx
                    .store
                    .save(PhaseId::Synthesis, &doc)
                    .await
                    .context("Failed to save synthesis artifact")?;
                log_state_file!(
                    self.observer,
                    phase.index(),
                    path.display(),
                    "Synthesized sections"
                );
                artifacts.synthesis = Some(doc);
            }
            Phase::Examples => {
                if self.config.skip_examples {
                    return Err(anyhow!("Skipped by configuration"));
                }
                let doc = phase4_examples::generate_examples(
                    ctx,
                    upstream(&artifacts.discovery, phase)?,
                    upstream(&artifacts.files, phase)?,
                    upstream(&artifacts.modules, phase)?,
                )
                .await?;
                ctx.persist(phase, &doc, "Code examples").await?;
                artifacts.examples = doc;
            }
            Phase::Faq => {
                let doc = phase5_faq::generate_faq(
                    ctx,
                    upstream(&artifacts.discovery, phase)?,
                    upstream(&artifacts.files, phase)?,
                    upstream(&artifacts.modules, phase)?,
                )
                .await?;
                ctx.persist(phase, &doc, "Frequently asked questions").await?;
                artifacts.faq = doc;
            }
        }
        Ok(())
    }

    /// Empty document for a degraded phase, saved like any other
    async fn substitute_empty(
        &self,
        ctx: &PhaseContext,
        phase: Phase,
        artifacts: &mut RunArtifacts,
    ) -> Result<()> {
        match phase {
            Phase::Examples => {
                artifacts.examples = ExamplesDocument::default();
                ctx.persist(phase, &artifacts.examples, "Code examples (degraded)")
                    .await?;
            }
            Phase::Faq => {
                artifacts.faq = FaqDocument::default();
                ctx.persist(phase, &artifacts.faq, "Frequently asked questions (degraded)")
                    .await?;
            }
            _ => {}
        }
        artifacts.degraded.push(phase);
        Ok(())
    }

    async fn assemble(
        &self,
        ctx: &PhaseContext,
        artifacts: &mut RunArtifacts,
    ) -> Result<FinalDocument> {
        let mut document = artifacts
            .synthesis
            .take()
            .ok_or_else(|| anyhow!("Run finished without a synthesis document"))?;
        document.examples = std::mem::take(&mut artifacts.examples.examples);
        document.faq = std::mem::take(&mut artifacts.faq.entries);
        document.degraded_phases = std::mem::take(&mut artifacts.degraded);

        let path = ctx
            .store
            .store(&document)
            .await
            .context("Failed to save final document")?;
        log_state_file!(self.observer, Phase::Faq.index(), path.display(), "Final document");
        Ok(document)
    }
}
