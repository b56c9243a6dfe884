//! Phase 1: per-file analysis
//!
//! Local extraction always runs and supplies the structural entities. When a
//! provider is configured each file is also a work item; a successful answer
//! overrides purpose, complexity and insights, a failed one leaves the local
//! record in place with a note.

use super::documents::{DiscoveryDocument, FileAnalysisSet};
use super::prompts;
use super::state::Phase;
use super::PhaseContext;
use crate::analysis::{cached, go, LocalAnalyzer};
use crate::coordinator::{ConcurrencyClass, WorkItem};
use crate::provider::{truncate_chars, CapabilityOutput};
use crate::types::{ComplexityScore, FileClassification, FileRecord, FileType};
use anyhow::{bail, Result};
use docs_agent_sdk::log_finding;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

const PURPOSE_CHARS: usize = 200;
const INSIGHT_CHARS: usize = 200;
const FALLBACK_INSIGHT_CHARS: usize = 500;
const RAW_SUMMARY_CHARS: usize = 2000;
/// Bullet insights this short are noise
const MIN_INSIGHT_CHARS: usize = 10;

static PURPOSE: OnceLock<Regex> = OnceLock::new();
static COMPLEXITY: OnceLock<Regex> = OnceLock::new();
static INSIGHTS: OnceLock<Regex> = OnceLock::new();

struct SourceFile<'a> {
    path: &'a str,
    language: &'a str,
    content: String,
}

pub(crate) async fn analyze_files(
    ctx: &PhaseContext,
    discovery: &DiscoveryDocument,
) -> Result<FileAnalysisSet> {
    let mut sources = Vec::new();
    let mut skipped = Vec::new();
    for file in &discovery.files {
        let Some(language) = analyzable_language(file) else {
            continue;
        };
        match ctx.reader.read(&file.path) {
            Ok(content) => sources.push(SourceFile {
                path: &file.path,
                language,
                content,
            }),
            Err(e) => {
                debug!(path = %file.path, error = %e, "Skipping unreadable file");
                skipped.push(file.path.clone());
            }
        }
    }
    info!(readable = sources.len(), skipped = skipped.len(), "Collected analyzable files");

    let local: Vec<FileRecord> = sources
        .iter()
        .map(|s| {
            let mut record = LocalAnalyzer.analyze(s.path, &s.content, Some(s.language));
            if let (Some(module), "go") = (&discovery.go_module, s.language) {
                go::classify_module_imports(&mut record, module);
            }
            record
        })
        .collect();

    let records = match &ctx.coordinator {
        Some(coordinator) => {
            let items = sources
                .iter()
                .map(|s| {
                    WorkItem::new(
                        format!("analyze_{}", s.path),
                        prompts::file_analysis(
                            s.path,
                            s.language,
                            &s.content,
                            ctx.config.prompt_char_limit,
                        ),
                    )
                })
                .collect();
            let outcomes = ctx.batch(coordinator, ConcurrencyClass::FileAnalysis, items).await;

            let mut failed = 0;
            let records: Vec<FileRecord> = local
                .into_iter()
                .zip(outcomes)
                .map(|(record, outcome)| match outcome.into_result() {
                    Ok(output) => merge_capability(record, &output),
                    Err(error) => {
                        failed += 1;
                        note_failure(record, &error)
                    }
                })
                .collect();
            if failed > 0 {
                log_finding!(
                    ctx.observer,
                    Phase::FileAnalysis.index(),
                    "{} of {} files fell back to local analysis",
                    failed,
                    records.len()
                );
            }
            records
        }
        None => local,
    };

    if records.is_empty() {
        bail!(
            "No analyzable file could be read ({} listed, {} skipped)",
            discovery.files.len(),
            skipped.len()
        );
    }
    Ok(FileAnalysisSet { records, skipped })
}

/// Source or config files with a known language
fn analyzable_language(file: &FileClassification) -> Option<&str> {
    match file.file_type {
        FileType::SourceCode | FileType::Config => file.language.as_deref(),
        _ => None,
    }
}

fn note_failure(mut record: FileRecord, error: &str) -> FileRecord {
    record
        .key_insights
        .push(format!("Capability analysis failed: {}", error));
    record
}

/// Capability judgement on top of the local record
pub(crate) fn merge_capability(mut record: FileRecord, output: &CapabilityOutput) -> FileRecord {
    let text = output.to_text();
    let verdict = match output {
        CapabilityOutput::Structured(value) => Verdict::from_value(value),
        CapabilityOutput::Raw(text) => Verdict::from_text(text),
    };

    if let Some(purpose) = verdict.purpose {
        record.purpose = purpose;
    }
    if let Some(score) = verdict.complexity {
        record.complexity_score = ComplexityScore::new(score);
    }
    record.key_insights = if verdict.insights.is_empty() {
        vec![truncate_chars(&text, FALLBACK_INSIGHT_CHARS)]
    } else {
        verdict.insights
    };
    record.raw_summary = truncate_chars(&text, RAW_SUMMARY_CHARS);
    record
}

#[derive(Debug, Default, PartialEq)]
struct Verdict {
    purpose: Option<String>,
    complexity: Option<i64>,
    insights: Vec<String>,
}

impl Verdict {
    fn from_value(value: &serde_json::Value) -> Self {
        let purpose = value["purpose"]
            .as_str()
            .map(|p| truncate_chars(p.trim(), PURPOSE_CHARS))
            .filter(|p| !p.is_empty());
        let complexity = value["complexity"]
            .as_i64()
            .or_else(|| value["complexity_score"].as_i64());
        let insights = value["key_insights"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .filter(|i| i.trim().chars().count() > MIN_INSIGHT_CHARS)
                    .map(|i| truncate_chars(i.trim(), INSIGHT_CHARS))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            purpose,
            complexity,
            insights,
        }
    }

    /// Reads `PURPOSE:`, `COMPLEXITY:` and the `KEY INSIGHTS:` bullets
    fn from_text(text: &str) -> Self {
        let purpose = cached(&PURPOSE, r"(?im)PURPOSE:?\s*(.+)$")
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim_start_matches(['-', '*', ' ', '\t']).trim())
            .map(|p| truncate_chars(p.trim_end_matches('*').trim(), PURPOSE_CHARS))
            .filter(|p| !p.is_empty());

        let complexity = cached(&COMPLEXITY, r"(?i)COMPLEXITY:?\**\s*(\d+)")
            .captures(text)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok());

        let insights = cached(&INSIGHTS, r"(?is)KEY INSIGHTS:?\**(.*)")
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|section| {
                section
                    .as_str()
                    .lines()
                    .map(str::trim)
                    .filter(|line| line.starts_with(['-', '*', '•']))
                    .map(|line| line.trim_start_matches(['-', '*', '•', ' ']).trim())
                    .filter(|insight| insight.chars().count() > MIN_INSIGHT_CHARS)
                    .map(|insight| truncate_chars(insight, INSIGHT_CHARS))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            purpose,
            complexity,
            insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "PURPOSE: Routes HTTP requests to handlers\n\
        COMPLEXITY: 14\n\
        KEY INSIGHTS:\n\
        - Registers every route at import time\n\
        * Handlers share one DB session\n\
        - short\n";

    #[test]
    fn test_text_verdict() {
        let verdict = Verdict::from_text(RESPONSE);
        assert_eq!(verdict.purpose.as_deref(), Some("Routes HTTP requests to handlers"));
        assert_eq!(verdict.complexity, Some(14));
        assert_eq!(
            verdict.insights,
            vec!["Registers every route at import time", "Handlers share one DB session"]
        );
    }

    #[test]
    fn test_merge_clamps_and_keeps_structure() {
        let local = LocalAnalyzer.analyze("app/routes.py", "class Router:\n    pass\n", Some("python"));
        let merged = merge_capability(local.clone(), &CapabilityOutput::Raw(RESPONSE.to_string()));

        assert_eq!(merged.complexity_score.get(), 10);
        assert_eq!(merged.classes, local.classes);
        assert_eq!(merged.purpose, "Routes HTTP requests to handlers");
        assert!(merged.raw_summary.starts_with("PURPOSE"));
    }

    #[test]
    fn test_merge_without_sections_keeps_local_purpose() {
        let local = LocalAnalyzer.analyze("lib/util.py", "def f():\n    pass\n", Some("python"));
        let merged = merge_capability(local.clone(), &CapabilityOutput::Raw("It is fine.".into()));

        assert_eq!(merged.purpose, local.purpose);
        assert_eq!(merged.complexity_score, local.complexity_score);
        assert_eq!(merged.key_insights, vec!["It is fine."]);
    }

    #[test]
    fn test_structured_verdict() {
        let value = serde_json::json!({
            "purpose": "Database models",
            "complexity": 0,
            "key_insights": ["Uses declarative base classes", "tiny"],
        });
        let local = LocalAnalyzer.analyze("db/models.py", "", Some("python"));
        let merged = merge_capability(local, &CapabilityOutput::Structured(value));

        assert_eq!(merged.purpose, "Database models");
        assert_eq!(merged.complexity_score.get(), 1);
        assert_eq!(merged.key_insights, vec!["Uses declarative base classes"]);
    }

    #[test]
    fn test_failure_note() {
        let local = LocalAnalyzer.analyze("a.py", "", Some("python"));
        let noted = note_failure(local, "provider unavailable: down");
        assert_eq!(
            noted.key_insights,
            vec!["Capability analysis failed: provider unavailable: down"]
        );
    }
}
