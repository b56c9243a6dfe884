//! Phase 2: modules, dependency graph and architecture

use super::documents::{
    DiscoveryDocument, FileAnalysisSet, ModuleAnalysisDocument, ModuleDetail, ModuleDetailSet,
};
use super::prompts;
use super::state::Phase;
use super::PhaseContext;
use crate::coordinator::{ConcurrencyClass, TaskCoordinator, WorkItem};
use crate::graph::{
    detect_architecture_patterns, key_relationships, DependencyGraphBuilder, ModuleIdentifier,
};
use crate::provider::truncate_chars;
use crate::types::{DependencyEdge, FileRecord, ModuleRecord};
use anyhow::Result;
use docs_agent_sdk::log_finding;
use std::collections::BTreeMap;
use tracing::{info, warn};

const KEY_RELATIONSHIPS: usize = 30;
const MAX_INSIGHTS: usize = 20;
const INSIGHT_CHARS: usize = 300;
const MIN_INSIGHT_CHARS: usize = 20;
const FALLBACK_INSIGHT_CHARS: usize = 500;
pub(crate) const PENDING_INSIGHT: &str = "Architecture analysis pending";

pub(crate) async fn analyze_modules(
    ctx: &PhaseContext,
    discovery: &DiscoveryDocument,
    files: &FileAnalysisSet,
) -> Result<ModuleAnalysisDocument> {
    let records = &files.records;
    let modules = ModuleIdentifier.identify(records);
    let edges = DependencyGraphBuilder.build(records);
    let patterns = detect_architecture_patterns(&modules, records);
    info!(
        modules = modules.len(),
        edges = edges.len(),
        patterns = patterns.len(),
        "Built module graph"
    );
    for pattern in &patterns {
        log_finding!(
            ctx.observer,
            Phase::ModuleAnalysis.index(),
            "Architecture pattern: {}",
            pattern
        );
    }

    let details = match &ctx.coordinator {
        Some(coordinator) => {
            analyze_with_provider(ctx, coordinator, discovery, records, &modules, &edges, &patterns)
                .await
        }
        None => ModuleDetailSet {
            modules: modules
                .iter()
                .map(|m| ModuleDetail {
                    name: m.name.clone(),
                    analysis: local_module_analysis(m, records, &edges),
                })
                .collect(),
            architecture: None,
        },
    };
    ctx.persist(Phase::ModuleAnalysis, &details, "Detailed module and architecture analysis")
        .await?;

    let architectural_insights = match &details.architecture {
        Some(text) => extract_insights(text),
        None => local_insights(&modules, &edges, records),
    };

    let public_apis: BTreeMap<String, Vec<String>> = modules
        .iter()
        .map(|m| (m.name.clone(), m.public_api.clone()))
        .collect();

    Ok(ModuleAnalysisDocument {
        data_flow: data_flow(&discovery.entry_points, &edges),
        entry_points: discovery.entry_points.clone(),
        public_apis,
        key_relationships: key_relationships(&edges, KEY_RELATIONSHIPS),
        architectural_insights,
        architecture_patterns: patterns,
        dependency_graph: edges,
        modules,
    })
}

async fn analyze_with_provider(
    ctx: &PhaseContext,
    coordinator: &TaskCoordinator,
    discovery: &DiscoveryDocument,
    records: &[FileRecord],
    modules: &[ModuleRecord],
    edges: &[DependencyEdge],
    patterns: &[String],
) -> ModuleDetailSet {
    let selected = &modules[..modules.len().min(ctx.config.max_capability_modules)];
    let items = selected
        .iter()
        .map(|module| {
            let members: Vec<&FileRecord> = records
                .iter()
                .filter(|r| module.files.contains(&r.path))
                .collect();
            WorkItem::new(
                format!("module_{}", module.name),
                prompts::module_analysis(module, &members),
            )
        })
        .collect();
    let outcomes = ctx.batch(coordinator, ConcurrencyClass::ModuleAnalysis, items).await;

    let mut details = ModuleDetailSet::default();
    for (module, outcome) in selected.iter().zip(outcomes) {
        match outcome.into_result() {
            Ok(output) => details.modules.push(ModuleDetail {
                name: module.name.clone(),
                analysis: output.to_text(),
            }),
            Err(error) => {
                warn!(module = %module.name, error = %error, "Module analysis failed");
                details.modules.push(ModuleDetail {
                    name: module.name.clone(),
                    analysis: local_module_analysis(module, records, edges),
                });
            }
        }
    }

    let work = prompts::architecture(
        &discovery.repository_name,
        modules,
        edges,
        patterns,
        &details,
    );
    let item = WorkItem::new("architecture", work).with_class(ConcurrencyClass::ModuleAnalysis);
    match coordinator.run_single(item).await.into_result() {
        Ok(output) => details.architecture = Some(output.to_text()),
        Err(error) => warn!(error = %error, "Architecture analysis failed, using local insights"),
    }
    details
}

fn local_module_analysis(
    module: &ModuleRecord,
    records: &[FileRecord],
    edges: &[DependencyEdge],
) -> String {
    let members: Vec<&FileRecord> = records
        .iter()
        .filter(|r| module.files.contains(&r.path))
        .collect();
    let classes: usize = members.iter().map(|r| r.classes.len()).sum();
    let functions: usize = members.iter().map(|r| r.functions.len()).sum();
    let outgoing = edges
        .iter()
        .filter(|e| module.files.contains(&e.source) && !module.files.contains(&e.target))
        .count();
    let incoming = edges
        .iter()
        .filter(|e| module.files.contains(&e.target) && !module.files.contains(&e.source))
        .count();

    let mut text = format!(
        "{} ({} files, {} classes, {} functions). {} outgoing and {} incoming cross-module edges.",
        module.purpose,
        module.files.len(),
        classes,
        functions,
        outgoing,
        incoming
    );
    if !module.public_api.is_empty() {
        let api: Vec<&str> = module.public_api.iter().take(5).map(String::as_str).collect();
        text.push_str(&format!(" Public API includes {}.", api.join(", ")));
    }
    text
}

/// Bullet and `key: value` lines of an architecture description
pub(crate) fn extract_insights(text: &str) -> Vec<String> {
    let mut insights = Vec::new();
    for line in text.lines().map(str::trim) {
        let chars = line.chars().count();
        let is_bullet = chars > 30 && line.starts_with(['-', '*', '•']);
        let is_labelled = chars > 50
            && line
                .char_indices()
                .take_while(|(i, _)| *i < 50)
                .any(|(_, c)| c == ':');
        if !(is_bullet || is_labelled) {
            continue;
        }
        let insight = line.trim_start_matches(['-', '*', '•', ' ']).trim();
        if insight.chars().count() > MIN_INSIGHT_CHARS {
            insights.push(truncate_chars(insight, INSIGHT_CHARS));
        }
        if insights.len() == MAX_INSIGHTS {
            break;
        }
    }

    if insights.is_empty() {
        let head = truncate_chars(text.trim(), FALLBACK_INSIGHT_CHARS);
        insights.push(if head.is_empty() {
            PENDING_INSIGHT.to_string()
        } else {
            head
        });
    }
    insights
}

fn local_insights(
    modules: &[ModuleRecord],
    edges: &[DependencyEdge],
    records: &[FileRecord],
) -> Vec<String> {
    let mut insights = vec![format!(
        "{} modules over {} analyzed files, connected by {} dependency edges",
        modules.len(),
        records.len(),
        edges.len()
    )];

    if let Some((target, count)) = most_depended_on(edges).first() {
        insights.push(format!("Most depended-on file: {} ({} dependents)", target, count));
    }

    let complex: Vec<&str> = records
        .iter()
        .filter(|r| r.complexity_score.get() >= 7)
        .map(|r| r.path.as_str())
        .take(5)
        .collect();
    if !complex.is_empty() {
        insights.push(format!("Highest-complexity files: {}", complex.join(", ")));
    }
    insights
}

/// Targets by dependent count, most first; ties keep first-seen order
fn most_depended_on(edges: &[DependencyEdge]) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for edge in edges {
        match counts.iter_mut().find(|(target, _)| *target == edge.target) {
            Some((_, count)) => *count += 1,
            None => counts.push((edge.target.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn data_flow(entry_points: &[String], edges: &[DependencyEdge]) -> Vec<String> {
    let mut flow = Vec::new();
    if !entry_points.is_empty() {
        let first: Vec<&str> = entry_points.iter().take(5).map(String::as_str).collect();
        flow.push(format!("Entry points: {}", first.join(", ")));
    }
    for (target, count) in most_depended_on(edges).into_iter().take(5) {
        flow.push(format!("{} is used by {} file(s)", target, count));
    }
    flow
}
