//! Phase 5: frequently asked questions

use super::documents::{
    DiscoveryDocument, FaqDocument, FaqEntry, FileAnalysisSet, ModuleAnalysisDocument,
    ModuleDetailSet,
};
use super::prompts;
use super::PhaseContext;
use crate::coordinator::{ConcurrencyClass, WorkItem};
use crate::provider::truncate_chars;
use crate::types::FileRecord;
use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

const COMPLEX_THRESHOLD: u8 = 7;
const MAX_ANSWER_CHARS: usize = 1000;
const MAX_INSIGHTS: usize = 10;
const ARCHITECTURE_CHARS: usize = 500;

pub(crate) async fn generate_faq(
    ctx: &PhaseContext,
    discovery: &DiscoveryDocument,
    files: &FileAnalysisSet,
    modules: &ModuleAnalysisDocument,
) -> Result<FaqDocument> {
    let complex: Vec<&FileRecord> = files
        .records
        .iter()
        .filter(|r| r.complexity_score.get() >= COMPLEX_THRESHOLD)
        .collect();

    let Some(coordinator) = &ctx.coordinator else {
        return Ok(FaqDocument {
            entries: local_faq(discovery, modules, &complex),
        });
    };

    let details: ModuleDetailSet = ctx
        .store
        .fetch()
        .await
        .context("Failed to load detailed module analysis")?
        .unwrap_or_default();
    let mut insights: Vec<String> = details
        .architecture
        .iter()
        .map(|text| format!("Architecture: {}", truncate_chars(text.trim(), ARCHITECTURE_CHARS)))
        .collect();
    insights.extend(
        files
            .records
            .iter()
            .flat_map(|r| r.key_insights.iter().take(2).map(move |i| format!("{}: {}", r.path, i)))
            .take(MAX_INSIGHTS),
    );
    let item = WorkItem::new("faq", prompts::faq(discovery, modules, &complex, &insights))
        .with_class(ConcurrencyClass::Faq);
    let output = coordinator
        .run_single(item)
        .await
        .into_result()
        .map_err(|e| anyhow!("FAQ generation failed: {}", e))?;

    let mut entries = parse_faq(&output.to_text());
    if entries.is_empty() {
        warn!("FAQ response had no `## Q:` entries, using local FAQ");
        entries = local_faq(discovery, modules, &complex);
    }
    info!(entries = entries.len(), "Generated FAQ");
    Ok(FaqDocument { entries })
}

/// Splits on `## Q:`; the first line is the question, the rest the answer
pub(crate) fn parse_faq(text: &str) -> Vec<FaqEntry> {
    text.split("## Q:")
        .skip(1)
        .filter_map(|section| {
            let section = section.trim();
            let (question, answer) = section.split_once('\n').unwrap_or((section, ""));
            let question = question.trim();
            if question.is_empty() {
                return None;
            }
            let answer = answer.replace("**A:**", "");
            let answer = answer.trim().trim_end_matches("---").trim_end();
            Some(FaqEntry {
                question: question.to_string(),
                answer: truncate_chars(answer, MAX_ANSWER_CHARS),
            })
        })
        .collect()
}

fn local_faq(
    discovery: &DiscoveryDocument,
    modules: &ModuleAnalysisDocument,
    complex: &[&FileRecord],
) -> Vec<FaqEntry> {
    let name = &discovery.repository_name;
    let mut entries = vec![FaqEntry {
        question: format!("What is {}?", name),
        answer: discovery.summary.clone(),
    }];

    if !discovery.entry_points.is_empty() {
        let list: Vec<String> = discovery
            .entry_points
            .iter()
            .take(5)
            .map(|e| format!("`{}`", e))
            .collect();
        entries.push(FaqEntry {
            question: format!("Where does execution start in {}?", name),
            answer: format!("The entry points are {}.", list.join(", ")),
        });
    }

    if !modules.modules.is_empty() {
        let lines: Vec<String> = modules
            .modules
            .iter()
            .take(10)
            .map(|m| format!("- `{}`: {}", m.name, m.purpose))
            .collect();
        entries.push(FaqEntry {
            question: "How is the codebase organized?".to_string(),
            answer: truncate_chars(
                &format!(
                    "The code is grouped into {} modules:\n{}",
                    modules.modules.len(),
                    lines.join("\n")
                ),
                MAX_ANSWER_CHARS,
            ),
        });
    }

    if !complex.is_empty() {
        let lines: Vec<String> = complex
            .iter()
            .take(8)
            .map(|f| {
                format!(
                    "- `{}` (complexity {}): {}",
                    f.path,
                    f.complexity_score.get(),
                    f.purpose
                )
            })
            .collect();
        entries.push(FaqEntry {
            question: "Which parts of the code are the most complex?".to_string(),
            answer: truncate_chars(
                &format!("Start reading these carefully:\n{}", lines.join("\n")),
                MAX_ANSWER_CHARS,
            ),
        });
    }

    if !modules.architecture_patterns.is_empty() {
        entries.push(FaqEntry {
            question: "What architecture does the project follow?".to_string(),
            answer: format!(
                "Detected patterns: {}.",
                modules.architecture_patterns.join(", ")
            ),
        });
    }
    entries
}
