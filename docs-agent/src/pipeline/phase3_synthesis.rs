//! Phase 3: documentation synthesis
//!
//! Every section has a local template. With a provider the overview and each
//! module page are also requested as capability calls; a failed call keeps
//! the template.

use super::documents::{
    DiscoveryDocument, DocSection, FileAnalysisSet, FinalDocument, ModuleAnalysisDocument,
    ModuleDetailSet,
};
use super::prompts;
use super::PhaseContext;
use crate::coordinator::{ConcurrencyClass, TaskCoordinator, WorkItem};
use crate::types::{FileRecord, FunctionRecord, ModuleRecord};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;
use tracing::{info, warn};

const DIAGRAM_EDGES: usize = 30;
const DIAGRAM_SOURCES: usize = 10;
const DIAGRAM_TARGETS: usize = 5;
const TABLE_MODULES: usize = 15;
const PURPOSE_COLUMN_CHARS: usize = 50;

pub(crate) async fn synthesize(
    ctx: &PhaseContext,
    discovery: &DiscoveryDocument,
    files: &FileAnalysisSet,
    modules: &ModuleAnalysisDocument,
) -> Result<FinalDocument> {
    let details: ModuleDetailSet = ctx
        .store
        .fetch()
        .await
        .context("Failed to load detailed module analysis")?
        .unwrap_or_default();

    let mut document = FinalDocument {
        repository_name: discovery.repository_name.clone(),
        overview: overview(discovery, modules),
        architecture: architecture_section(modules),
        modules: module_sections(modules, &files.records, &details),
        api_reference: api_reference(&files.records),
        getting_started: getting_started(discovery),
        ..Default::default()
    };

    if let Some(coordinator) = &ctx.coordinator {
        enhance(ctx, coordinator, discovery, modules, &details, &mut document).await;
    }
    info!(modules = document.modules.len(), "Synthesized documentation");
    Ok(document)
}

async fn enhance(
    ctx: &PhaseContext,
    coordinator: &TaskCoordinator,
    discovery: &DiscoveryDocument,
    modules: &ModuleAnalysisDocument,
    details: &ModuleDetailSet,
    document: &mut FinalDocument,
) {
    let mut items = vec![WorkItem::new("overview", prompts::overview(discovery, modules))];
    items.extend(modules.modules.iter().map(|m| {
        WorkItem::new(
            format!("doc_{}", m.name),
            prompts::module_doc(m, details.analysis_for(&m.name)),
        )
    }));

    let mut outcomes = ctx
        .batch(coordinator, ConcurrencyClass::Synthesis, items)
        .await
        .into_iter();

    if let Some(outcome) = outcomes.next() {
        match outcome.into_result() {
            Ok(output) => document.overview = output.to_text(),
            Err(error) => warn!(error = %error, "Overview synthesis failed, keeping template"),
        }
    }
    for (section, outcome) in document.modules.iter_mut().zip(outcomes) {
        match outcome.into_result() {
            Ok(output) => section.content = output.to_text(),
            Err(error) => warn!(
                module = %section.title,
                error = %error,
                "Module page synthesis failed, keeping template"
            ),
        }
    }
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.iter().map(|i| format!("- {}", i)).collect::<Vec<_>>().join("\n")
    }
}

fn overview(discovery: &DiscoveryDocument, modules: &ModuleAnalysisDocument) -> String {
    let joined = |items: &[String], empty: &str| {
        if items.is_empty() {
            empty.to_string()
        } else {
            items.join(", ")
        }
    };
    let insights: Vec<String> = modules.architectural_insights.iter().take(5).cloned().collect();
    format!(
        "# {name}\n\n{summary}\n\n## Quick Facts\n\n\
         - **Languages**: {languages}\n\
         - **Frameworks**: {frameworks}\n\
         - **Total Files**: {total}\n\
         - **Modules**: {module_count}\n\n\
         ## Architecture Patterns\n\n{patterns}\n\n\
         ## Key Insights\n\n{insights}\n",
        name = discovery.repository_name,
        summary = discovery.summary,
        languages = joined(&discovery.detected_languages, "Not detected"),
        frameworks = joined(&discovery.detected_frameworks, "None detected"),
        total = discovery.total_files,
        module_count = modules.modules.len(),
        patterns = bullet_list(&modules.architecture_patterns, "No specific patterns detected."),
        insights = bullet_list(&insights, "See module documentation for details."),
    )
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) if idx > 0 => &path[..idx],
        _ => "root",
    }
}

fn architecture_section(modules: &ModuleAnalysisDocument) -> DocSection {
    // Cross-directory dependencies, grouped by source directory
    let mut groups: Vec<(&str, BTreeSet<&str>)> = Vec::new();
    for edge in modules.dependency_graph.iter().take(DIAGRAM_EDGES) {
        let (source, target) = (parent_dir(&edge.source), parent_dir(&edge.target));
        if source == target {
            continue;
        }
        match groups.iter_mut().find(|(s, _)| *s == source) {
            Some((_, targets)) => {
                targets.insert(target);
            }
            None => groups.push((source, BTreeSet::from([target]))),
        }
    }

    let mut diagram = String::from("```\nModule Dependencies:\n");
    diagram.push_str(&"=".repeat(40));
    diagram.push('\n');
    for (source, targets) in groups.iter().take(DIAGRAM_SOURCES) {
        let _ = writeln!(diagram, "\n{}/", source);
        for target in targets.iter().take(DIAGRAM_TARGETS) {
            let _ = writeln!(diagram, "  └── depends on → {}/", target);
        }
    }
    diagram.push_str("```");

    let mut content = format!(
        "## System Architecture\n\n### Module Overview\n\n\
         The codebase is organized into {} modules:\n\n\
         | Module | Files | Purpose |\n|--------|-------|---------|\n",
        modules.modules.len()
    );
    for module in modules.modules.iter().take(TABLE_MODULES) {
        let purpose: String = module.purpose.chars().take(PURPOSE_COLUMN_CHARS).collect();
        let _ = writeln!(
            content,
            "| `{}` | {} | {} |",
            module.name,
            module.files.len(),
            purpose.replace('|', "\\|")
        );
    }
    let _ = write!(
        content,
        "\n### Dependency Graph\n\n{}\n\n### Architecture Patterns Detected\n\n",
        diagram
    );
    for pattern in &modules.architecture_patterns {
        let _ = writeln!(content, "- **{}**", pattern);
    }
    content.push_str("\n### Data Flow\n\n");
    for flow in &modules.data_flow {
        let _ = writeln!(content, "- {}", flow);
    }

    DocSection::new("Architecture", content)
}

fn module_sections(
    modules: &ModuleAnalysisDocument,
    records: &[FileRecord],
    details: &ModuleDetailSet,
) -> Vec<DocSection> {
    let by_path: HashMap<&str, &FileRecord> = records.iter().map(|r| (r.path.as_str(), r)).collect();
    modules
        .modules
        .iter()
        .map(|module| DocSection::new(&module.name, module_page(module, &by_path, details)))
        .collect()
}

fn module_page(
    module: &ModuleRecord,
    by_path: &HashMap<&str, &FileRecord>,
    details: &ModuleDetailSet,
) -> String {
    let mut content = format!(
        "### {}\n\n**Path**: `{}`\n\n**Purpose**: {}\n\n**Files** ({}):\n",
        module.name,
        module.path,
        module.purpose,
        module.files.len()
    );
    for file in module.files.iter().take(10) {
        let _ = writeln!(content, "- `{}`", file);
    }
    if module.files.len() > 10 {
        let _ = writeln!(content, "- ... and {} more files", module.files.len() - 10);
    }

    content.push_str("\n**Public API**:\n");
    for api in module.public_api.iter().take(10) {
        let _ = writeln!(content, "- `{}`", api);
    }

    if let Some(analysis) = details.analysis_for(&module.name) {
        let _ = write!(content, "\n#### Analysis\n\n{}\n", analysis.trim());
    }

    content.push_str("\n#### Key Components\n\n");
    for record in module.files.iter().take(5).filter_map(|f| by_path.get(f.as_str())) {
        let _ = writeln!(content, "**{}**\n- Purpose: {}", record.file_name(), record.purpose);
        if !record.classes.is_empty() {
            let names: Vec<&str> = record.classes.iter().take(5).map(|c| c.name.as_str()).collect();
            let _ = writeln!(content, "- Classes: {}", names.join(", "));
        }
        if !record.functions.is_empty() {
            let names: Vec<&str> = record.functions.iter().take(5).map(|f| f.name.as_str()).collect();
            let _ = writeln!(content, "- Functions: {}", names.join(", "));
        }
        content.push('\n');
    }
    content
}

fn signature(function: &FunctionRecord) -> String {
    let mut text = format!("{}({})", function.name, function.parameters.join(", "));
    if let Some(ret) = &function.return_type {
        let _ = write!(text, " → {}", ret);
    }
    text
}

fn api_reference(records: &[FileRecord]) -> DocSection {
    let mut content =
        String::from("## API Reference\n\nThis section documents the public API of the codebase.\n\n");

    for record in records {
        if record.exports.is_empty() || (record.classes.is_empty() && record.functions.is_empty()) {
            continue;
        }
        let _ = writeln!(content, "### {}\n", record.path);

        if !record.classes.is_empty() {
            content.push_str("#### Classes\n\n");
            for class in &record.classes {
                let _ = write!(content, "**`{}`**", class.name);
                if !class.base_classes.is_empty() {
                    let _ = write!(content, " (extends {})", class.base_classes.join(", "));
                }
                let _ = write!(content, "\n\n{}\n\n", class.description);
                if !class.methods.is_empty() {
                    content.push_str("Methods:\n");
                    for method in class.methods.iter().take(5) {
                        let _ = writeln!(content, "- `{}`", signature(method));
                    }
                    content.push('\n');
                }
            }
        }

        let exported: Vec<&FunctionRecord> = record
            .functions
            .iter()
            .filter(|f| record.exports.contains(&f.name))
            .take(10)
            .collect();
        if !exported.is_empty() {
            content.push_str("#### Functions\n\n");
            for function in exported {
                let _ = write!(content, "**`{}`**\n\n", signature(function));
                if !function.description.is_empty() {
                    let _ = write!(content, "{}\n\n", function.description);
                }
            }
        }
    }

    DocSection::new("API Reference", content)
}

fn getting_started(discovery: &DiscoveryDocument) -> DocSection {
    let has = |language: &str| discovery.detected_languages.iter().any(|l| l == language);
    let scripted = has("javascript") || has("typescript");

    let mut content = String::from(
        "## Getting Started\n\nThis section explains how to set up and run the project.\n\n### Prerequisites\n\n",
    );
    if has("python") {
        content.push_str("- Python 3.8 or higher\n");
    }
    if scripted {
        content.push_str("- Node.js 16 or higher\n");
    }
    if has("go") {
        content.push_str("- Go 1.19 or higher\n");
    }
    if has("rust") {
        content.push_str("- Rust (latest stable)\n");
    }

    content.push_str("\n### Installation\n\n");
    if has("python") {
        content.push_str(
            "```bash\npython -m venv venv\nsource venv/bin/activate\npip install -r requirements.txt\n```\n\n",
        );
    }
    if scripted {
        content.push_str("```bash\nnpm install\n```\n\n");
    }
    if has("rust") {
        content.push_str("```bash\ncargo build --release\n```\n\n");
    }
    if has("go") {
        content.push_str("```bash\ngo mod download\n```\n\n");
    }

    content.push_str("### Running\n\n");
    if !discovery.entry_points.is_empty() {
        content.push_str("**Entry Points:**\n");
        for entry in discovery.entry_points.iter().take(3) {
            let _ = writeln!(content, "- `{}`", entry);
        }
        content.push('\n');
    }
    if has("python") {
        let main = discovery
            .entry_points
            .iter()
            .find(|e| e.ends_with(".py"))
            .map_or("main.py", String::as_str);
        let _ = write!(content, "```bash\npython {}\n```\n\n", main);
    }
    if scripted {
        content.push_str("```bash\nnpm start\n```\n\n");
    }
    if has("rust") {
        content.push_str("```bash\ncargo run\n```\n\n");
    }

    DocSection::new("Getting Started", content)
}
