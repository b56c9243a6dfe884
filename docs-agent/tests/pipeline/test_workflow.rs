//! End-to-end pipeline runs against a fixture repository

use super::common::*;
use docs_agent::pipeline::{prompts, FinalDocument, HandoffStore, Phase, PhaseId};
use docs_agent::{PhasePipeline, PipelineState};
use docs_agent_sdk::{PhaseStatus, PipelineEvent, RecordingObserver};
use std::sync::Arc;

// ============================================================================
// Offline Runs
// ============================================================================

#[tokio::test]
async fn test_offline_run_completes_every_phase() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let config = docs_agent::DocsConfig {
        offline: true,
        ..config_for(repo.path(), output.path())
    };
    let observer = Arc::new(RecordingObserver::new());

    let report = PhasePipeline::new(config)
        .unwrap()
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.state, PipelineState::Done);
    assert!(report.succeeded());
    assert!(Phase::ALL
        .iter()
        .all(|p| report.status_of(*p) == PhaseStatus::Completed));
    assert_eq!(
        observer.phases_with(PhaseStatus::Completed),
        vec!["Discovery", "FileAnalysis", "ModuleAnalysis", "Synthesis", "Examples", "FAQ"]
    );

    let document = report.final_document.as_ref().unwrap();
    assert!(document.degraded_phases.is_empty());
    assert_eq!(document.examples.len(), 4);
    assert!(!document.faq.is_empty());
    assert!(document.modules.iter().any(|m| m.title == "app"));

    let store = HandoffStore::new(output.path().join(".handoffs"));
    for id in [
        PhaseId::Discovery,
        PhaseId::Exploration,
        PhaseId::FileAnalysis,
        PhaseId::ModuleAnalysis,
        PhaseId::ModuleDetail,
        PhaseId::Synthesis,
        PhaseId::Examples,
        PhaseId::Faq,
        PhaseId::Final,
    ] {
        assert!(store.contains(id), "missing {} artifact", id);
    }
    assert_eq!(store.fetch::<FinalDocument>().await.unwrap().as_ref(), Some(document));

    for file in ["README.md", "API_REFERENCE.md", "EXAMPLES.md", "FAQ.md", "modules/app.md"] {
        assert!(output.path().join(file).is_file(), "missing {}", file);
    }
}

#[tokio::test]
async fn test_rerun_starts_from_a_clean_handoff_directory() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let stale = output.path().join(".handoffs/stale.yaml");
    write(output.path(), ".handoffs/stale.yaml", "left: over\n");
    let config = docs_agent::DocsConfig {
        offline: true,
        ..config_for(repo.path(), output.path())
    };

    let report = PhasePipeline::new(config).unwrap().run().await.unwrap();

    assert!(report.succeeded());
    assert!(!stale.exists());
}

#[tokio::test]
async fn test_skip_examples_is_recorded_as_degraded() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let config = docs_agent::DocsConfig {
        offline: true,
        skip_examples: true,
        ..config_for(repo.path(), output.path())
    };

    let report = PhasePipeline::new(config).unwrap().run().await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.status_of(Phase::Examples), PhaseStatus::Degraded);
    let document = report.final_document.unwrap();
    assert!(document.examples.is_empty());
    assert_eq!(document.degraded_phases, vec![Phase::Examples]);
}

#[tokio::test]
async fn test_empty_repository_fails_file_analysis() {
    let repo = tempfile::tempdir().unwrap();
    write(repo.path(), "README.md", "# Nothing to analyze\n");
    let output = tempfile::tempdir().unwrap();
    let config = docs_agent::DocsConfig {
        offline: true,
        ..config_for(repo.path(), output.path())
    };

    let report = PhasePipeline::new(config).unwrap().run().await.unwrap();

    let failure = report.failure().unwrap();
    assert_eq!(failure.phase, Phase::FileAnalysis);
    assert!(failure.cause.contains("No analyzable file"));
    assert_eq!(report.status_of(Phase::ModuleAnalysis), PhaseStatus::NotStarted);
    assert!(report.final_document.is_none());
}

// ============================================================================
// Runs With a Provider
// ============================================================================

#[tokio::test]
async fn test_discovery_outage_halts_the_run() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new().failing_system(prompts::DISCOVERY_SYSTEM));
    let observer = Arc::new(RecordingObserver::new());

    let report = PhasePipeline::new(config_for(repo.path(), output.path()))
        .unwrap()
        .with_provider(provider)
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    match &report.state {
        PipelineState::Failed { phase, cause } => {
            assert_eq!(*phase, Phase::Discovery);
            assert!(cause.contains("scripted outage"), "cause was {}", cause);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(observer.phases_with(PhaseStatus::Failed), vec!["Discovery"]);
    assert!(observer.phases_with(PhaseStatus::Completed).is_empty());
    assert!(observer.events().iter().any(|e| matches!(
        e,
        PipelineEvent::RunFinished { succeeded: false, failed_phase: Some(name), .. } if name == "Discovery"
    )));

    let store = HandoffStore::new(output.path().join(".handoffs"));
    assert!(!store.contains(PhaseId::Discovery));
    assert!(!store.contains(PhaseId::Exploration));
    assert!(!store.contains(PhaseId::FileAnalysis));
    assert!(!store.contains(PhaseId::ModuleAnalysis));
    assert!(!output.path().join("README.md").exists());
}

#[tokio::test]
async fn test_examples_outage_degrades_and_run_completes() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new().failing_system(prompts::EXAMPLES_SYSTEM));
    let observer = Arc::new(RecordingObserver::new());

    let report = PhasePipeline::new(config_for(repo.path(), output.path()))
        .unwrap()
        .with_provider(provider)
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(observer.phases_with(PhaseStatus::Degraded), vec!["Examples"]);

    let document = report.final_document.unwrap();
    assert!(document.examples.is_empty());
    assert_eq!(document.degraded_phases, vec![Phase::Examples]);
    assert!(!document.overview.is_empty());
    assert!(!document.architecture.content.is_empty());
    assert!(!document.modules.is_empty());
    assert!(!document.api_reference.content.is_empty());
    assert_eq!(document.faq.len(), 2);
    assert_eq!(document.faq[0].question, "How do I run it?");
}

#[tokio::test]
async fn test_provider_answers_flow_into_file_records() {
    let repo = fixture_repo();
    let output = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new());

    let report = PhasePipeline::new(config_for(repo.path(), output.path()))
        .unwrap()
        .with_provider(provider.clone())
        .run()
        .await
        .unwrap();

    assert!(report.succeeded());
    let document = report.final_document.unwrap();
    assert_eq!(document.examples.len(), 5);
    assert_eq!(document.examples[4].title, "Integration With A Scheduler");

    let store = HandoffStore::new(output.path().join(".handoffs"));
    let files = store
        .fetch::<docs_agent::pipeline::FileAnalysisSet>()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(files.records.len(), 3);
    assert!(files
        .records
        .iter()
        .all(|r| r.purpose == "Part of the user service" && r.complexity_score.get() == 4));
}
