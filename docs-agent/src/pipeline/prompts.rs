//! Prompt text for capability calls
//!
//! Every builder returns a ready [`WorkDescriptor`]. The system prompt
//! constants are public so scripted providers can tell phases apart.

use super::documents::{AreaInsight, DiscoveryDocument, ModuleAnalysisDocument, ModuleDetailSet};
use crate::provider::{truncate_chars, WorkDescriptor};
use crate::types::{DependencyEdge, FileRecord, ModuleRecord};

pub const EXPLORATION_SYSTEM: &str =
    "You are a repository explorer. Describe one directory of a codebase precisely and briefly.";
pub const DISCOVERY_SYSTEM: &str =
    "You are a software architect. Summarize what a repository is and how it is organized.";
pub const FILE_ANALYSIS_SYSTEM: &str =
    "You are a code analyst. Explain what a single source file does and how complex it is.";
pub const MODULE_ANALYSIS_SYSTEM: &str =
    "You are a software architect. Analyze modules and the architecture they form.";
pub const SYNTHESIS_SYSTEM: &str =
    "You are a technical writer. Write clear, accurate markdown documentation.";
pub const EXAMPLES_SYSTEM: &str =
    "You are a developer advocate. Write complete, runnable code examples.";
pub const FAQ_SYSTEM: &str =
    "You are a support engineer. Answer the questions users actually ask about a codebase.";

/// Characters of one exploration insight quoted in the summary prompt
const INSIGHT_CHARS: usize = 2000;
const SUMMARY_INSIGHTS: usize = 15;
const ARCHITECTURE_EDGES: usize = 25;
const ARCHITECTURE_SUMMARIES: usize = 8;
const SUMMARY_CHARS: usize = 1500;

pub fn explore_directory(area: &str, files: &[&str]) -> WorkDescriptor {
    let listing = if files.is_empty() {
        "(no files directly inside)".to_string()
    } else {
        files.iter().map(|f| format!("- {}", f)).collect::<Vec<_>>().join("\n")
    };
    WorkDescriptor::text(format!(
        r#"Explore the `{area}` directory of this repository.

FILES:
{listing}

Answer in these sections:
PURPOSE: what this directory is for
KEY FILES: the most important files and why
KEY COMPONENTS: main classes, functions or services
PATTERNS: design or architecture patterns in use
DEPENDENCIES: what it relies on, inside and outside the repository
EXPORTS: what it offers to the rest of the code
INSIGHTS: anything a new contributor should know"#
    ))
    .with_system(EXPLORATION_SYSTEM)
}

pub fn discovery_summary(
    repository: &str,
    languages: &[String],
    frameworks: &[String],
    insights: &[AreaInsight],
) -> WorkDescriptor {
    let explored = insights
        .iter()
        .take(SUMMARY_INSIGHTS)
        .map(|i| format!("## {}\n{}", i.area, truncate_chars(&i.analysis, INSIGHT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n");
    WorkDescriptor::text(format!(
        r#"Write a concise overview (2-4 paragraphs) of the repository `{repository}`.

LANGUAGES: {languages}
FRAMEWORKS: {frameworks}

DIRECTORY EXPLORATIONS:
{explored}

Cover what the project does, how it is organized and the main technologies."#,
        languages = join_or(languages, "unknown"),
        frameworks = join_or(frameworks, "none detected"),
    ))
    .with_system(DISCOVERY_SYSTEM)
}

pub fn file_analysis(path: &str, language: &str, content: &str, limit: usize) -> WorkDescriptor {
    let mut body = truncate_chars(content, limit);
    if body.len() < content.len() {
        body.push_str("\n... [truncated - file continues]");
    }
    WorkDescriptor::text(format!(
        r#"Analyze the {language} file `{path}`.

```{language}
{body}
```

Respond with:
PURPOSE: one sentence
COMPLEXITY: an integer from 1 (trivial) to 10 (very complex)
KEY INSIGHTS:
- one bullet per notable behavior, invariant or risk"#
    ))
    .with_system(FILE_ANALYSIS_SYSTEM)
    .with_max_tokens(2000)
}

pub fn module_analysis(module: &ModuleRecord, records: &[&FileRecord]) -> WorkDescriptor {
    let files = records
        .iter()
        .map(|r| {
            let classes: Vec<&str> = r.classes.iter().take(5).map(|c| c.name.as_str()).collect();
            let functions: Vec<&str> = r.functions.iter().take(5).map(|f| f.name.as_str()).collect();
            format!(
                "- {} ({}): classes [{}], functions [{}]",
                r.path,
                r.purpose,
                classes.join(", "),
                functions.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    WorkDescriptor::text(format!(
        r#"Analyze the module `{name}` at `{path}`.

PURPOSE (inferred): {purpose}
PUBLIC API: {api}

FILES:
{files}

Describe its responsibility, its main abstractions, how the files collaborate and how
other code is expected to use it."#,
        name = module.name,
        path = module.path,
        purpose = module.purpose,
        api = join_or(&module.public_api, "none"),
    ))
    .with_system(MODULE_ANALYSIS_SYSTEM)
    .with_temperature(0.4)
}

pub fn architecture(
    repository: &str,
    modules: &[ModuleRecord],
    edges: &[DependencyEdge],
    patterns: &[String],
    details: &ModuleDetailSet,
) -> WorkDescriptor {
    let module_lines = modules
        .iter()
        .map(|m| format!("- {} ({} files): {}", m.name, m.files.len(), m.purpose))
        .collect::<Vec<_>>()
        .join("\n");
    let edge_lines = edges
        .iter()
        .take(ARCHITECTURE_EDGES)
        .map(|e| format!("- {} -> {} ({})", e.source, e.target, e.relationship))
        .collect::<Vec<_>>()
        .join("\n");
    let summaries = details
        .modules
        .iter()
        .take(ARCHITECTURE_SUMMARIES)
        .map(|d| format!("## {}\n{}", d.name, truncate_chars(&d.analysis, SUMMARY_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n");
    WorkDescriptor::text(format!(
        r#"Describe the architecture of `{repository}`.

MODULES:
{module_lines}

DEPENDENCIES:
{edge_lines}

DETECTED PATTERNS: {patterns}

MODULE ANALYSES:
{summaries}

List the architectural insights as bullet points: layering, data flow, coupling hot
spots and extension points."#,
        patterns = join_or(patterns, "none"),
    ))
    .with_system(MODULE_ANALYSIS_SYSTEM)
    .with_temperature(0.4)
}

pub fn overview(discovery: &DiscoveryDocument, modules: &ModuleAnalysisDocument) -> WorkDescriptor {
    let module_lines = modules
        .modules
        .iter()
        .take(15)
        .map(|m| format!("- {}: {}", m.name, m.purpose))
        .collect::<Vec<_>>()
        .join("\n");
    WorkDescriptor::text(format!(
        r#"Write the README overview for `{name}` in markdown, starting with a level-1 heading.

SUMMARY:
{summary}

LANGUAGES: {languages}
FRAMEWORKS: {frameworks}
ENTRY POINTS: {entries}

MODULES:
{module_lines}

ARCHITECTURAL INSIGHTS:
{insights}

Include a short description, key features and a "Quick Facts" list."#,
        name = discovery.repository_name,
        summary = discovery.summary,
        languages = join_or(&discovery.detected_languages, "unknown"),
        frameworks = join_or(&discovery.detected_frameworks, "none detected"),
        entries = join_or(&discovery.entry_points, "not explicitly defined"),
        insights = modules
            .architectural_insights
            .iter()
            .take(8)
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n"),
    ))
    .with_system(SYNTHESIS_SYSTEM)
    .with_max_tokens(3000)
}

pub fn module_doc(module: &ModuleRecord, detail: Option<&str>) -> WorkDescriptor {
    WorkDescriptor::text(format!(
        r#"Write the documentation page for module `{name}` (path `{path}`) in markdown,
starting with a level-3 heading.

PURPOSE: {purpose}
FILES: {files}
PUBLIC API: {api}

ANALYSIS:
{detail}

Explain what the module is for, its main components and how to use its public API."#,
        name = module.name,
        path = module.path,
        purpose = module.purpose,
        files = module.files.join(", "),
        api = join_or(&module.public_api, "none"),
        detail = detail.unwrap_or("(no detailed analysis available)"),
    ))
    .with_system(SYNTHESIS_SYSTEM)
}

pub fn examples(
    language: &str,
    public_apis: &[String],
    classes: &[String],
    functions: &[String],
) -> WorkDescriptor {
    WorkDescriptor::text(format!(
        r#"Generate 2 additional code examples for this {language} codebase.

PUBLIC APIS:
{apis}

KEY CLASSES:
{classes}

KEY FUNCTIONS:
{functions}

1. An integration example showing how to use this code with external systems
2. An advanced usage example showing complex features

For each example write a `### Title` line, a one-sentence description, then one fenced
code block with the complete code."#,
        apis = bullets(public_apis),
        classes = bullets(classes),
        functions = bullets(functions),
    ))
    .with_system(EXAMPLES_SYSTEM)
    .with_temperature(0.5)
}

pub fn faq(
    discovery: &DiscoveryDocument,
    modules: &ModuleAnalysisDocument,
    complex_files: &[&FileRecord],
    insights: &[String],
) -> WorkDescriptor {
    let module_lines = modules
        .modules
        .iter()
        .take(10)
        .map(|m| format!("- {}: {}", m.name, m.purpose))
        .collect::<Vec<_>>()
        .join("\n");
    let complex = complex_files
        .iter()
        .take(8)
        .map(|f| format!("- {} (complexity {}): {}", f.path, f.complexity_score.get(), f.purpose))
        .collect::<Vec<_>>()
        .join("\n");
    WorkDescriptor::text(format!(
        r#"Generate 12-15 frequently asked questions for `{name}`.

OVERVIEW:
{summary}

LANGUAGES: {languages}
ENTRY POINTS: {entries}

MODULES:
{module_lines}

COMPLEX AREAS:
{complex}

INSIGHTS:
{insights}

Cover getting started, usage, architecture, troubleshooting and extension.
Format every entry as:

## Q: <question>
**A:** <answer>"#,
        name = discovery.repository_name,
        summary = discovery.summary,
        languages = join_or(&discovery.detected_languages, "unknown"),
        entries = join_or(&discovery.entry_points, "not explicitly defined"),
        insights = bullets(insights),
    ))
    .with_system(FAQ_SYSTEM)
    .with_temperature(0.5)
    .with_max_tokens(6000)
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        "- (none)".to_string()
    } else {
        items.iter().map(|i| format!("- {}", i)).collect::<Vec<_>>().join("\n")
    }
}
