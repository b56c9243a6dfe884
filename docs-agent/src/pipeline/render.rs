//! Markdown files from a [`FinalDocument`]

use super::documents::{CodeExample, DocSection, FaqEntry, FinalDocument};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Write every documentation file under `output_dir`, returning their paths
pub async fn render(document: &FinalDocument, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let modules_dir = output_dir.join("modules");
    fs::create_dir_all(&modules_dir)
        .await
        .with_context(|| format!("Failed to create {}", modules_dir.display()))?;

    let mut files = vec![
        (output_dir.join("README.md"), readme(document)),
        (
            output_dir.join("API_REFERENCE.md"),
            section_page(&document.api_reference),
        ),
        (
            output_dir.join("EXAMPLES.md"),
            examples_page(&document.examples),
        ),
        (
            output_dir.join("FAQ.md"),
            faq_page(&document.repository_name, &document.faq),
        ),
    ];
    for (module, stem) in document.modules.iter().zip(page_stems(&document.modules)) {
        files.push((modules_dir.join(format!("{}.md", stem)), section_page(module)));
    }

    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    info!(files = written.len(), dir = %output_dir.display(), "Rendered documentation");
    Ok(written)
}

/// Module names may contain path separators
fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// One distinct file stem per module page, suffixing `_2`, `_3`, ... when
/// two titles sanitize to the same stem
fn page_stems(modules: &[DocSection]) -> Vec<String> {
    let mut used = HashSet::new();
    modules
        .iter()
        .map(|module| {
            let base = file_stem(&module.title);
            let mut stem = base.clone();
            let mut n = 2;
            while !used.insert(stem.clone()) {
                stem = format!("{}_{}", base, n);
                n += 1;
            }
            stem
        })
        .collect()
}

fn anchor(title: &str) -> String {
    title.to_lowercase().replace([' ', '/'], "-")
}

fn readme(document: &FinalDocument) -> String {
    let mut content = document.overview.trim_end().to_string();
    content.push_str("\n\n");
    content.push_str(document.getting_started.content.trim_end());
    content.push_str("\n\n");
    content.push_str(document.architecture.content.trim_end());
    content.push_str("\n\n## Documentation\n\n- [API Reference](API_REFERENCE.md)\n");
    if !document.examples.is_empty() {
        content.push_str("- [Examples](EXAMPLES.md)\n");
    }
    if !document.faq.is_empty() {
        content.push_str("- [FAQ](FAQ.md)\n");
    }
    for (module, stem) in document.modules.iter().zip(page_stems(&document.modules)) {
        let _ = writeln!(content, "- [{}](modules/{}.md)", module.title, stem);
    }
    if !document.degraded_phases.is_empty() {
        let names: Vec<&str> = document.degraded_phases.iter().map(|p| p.name()).collect();
        let _ = write!(
            content,
            "\n> Generated without: {}.\n",
            names.join(", ")
        );
    }
    content
}

fn section_page(section: &DocSection) -> String {
    let mut content = section.content.trim_end().to_string();
    content.push('\n');
    for sub in &section.subsections {
        let _ = write!(content, "\n## {}\n\n{}\n", sub.title, sub.content.trim_end());
    }
    content
}

fn examples_page(examples: &[CodeExample]) -> String {
    let mut content = String::from(
        "# Code Examples\n\nThis document contains practical code examples for using this codebase.\n\n",
    );
    if examples.is_empty() {
        content.push_str("No examples were generated for this run.\n");
        return content;
    }

    content.push_str("## Table of Contents\n\n");
    for (i, example) in examples.iter().enumerate() {
        let _ = writeln!(content, "{}. [{}](#{})", i + 1, example.title, anchor(&example.title));
    }
    content.push_str("\n---\n\n");

    for example in examples {
        let _ = write!(content, "## {}\n\n", example.title);
        if !example.description.is_empty() {
            let _ = write!(content, "{}\n\n", example.description);
        }
        if !example.prerequisites.is_empty() {
            content.push_str("**Prerequisites:**\n");
            for prerequisite in &example.prerequisites {
                let _ = writeln!(content, "- {}", prerequisite);
            }
            content.push('\n');
        }
        let _ = write!(
            content,
            "```{}\n{}\n```\n\n",
            example.language,
            example.code.trim_end()
        );
        if !example.file_references.is_empty() {
            content.push_str("**Related files:**\n");
            for file in &example.file_references {
                let _ = writeln!(content, "- `{}`", file);
            }
            content.push('\n');
        }
        content.push_str("---\n\n");
    }
    content
}

fn faq_page(repository: &str, entries: &[FaqEntry]) -> String {
    let mut content = format!(
        "# Frequently Asked Questions - {repository}\n\n\
         This FAQ addresses common questions about the {repository} codebase, based on automated analysis.\n\n---\n\n"
    );
    if entries.is_empty() {
        content.push_str("No FAQ entries were generated for this run.\n");
        return content;
    }
    for entry in entries {
        let _ = write!(content, "## Q: {}\n\n**A:** {}\n\n---\n\n", entry.question, entry.answer);
    }
    content
}
