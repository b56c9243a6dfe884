//! Phase 0: repository discovery
//!
//! Classifies every file, reads the manifests for languages, frameworks and
//! entry points, explores each top-level directory (one work item per
//! directory) and ends with a one-call repository summary.

use super::documents::{AreaInsight, DiscoveryDocument, ExplorationReport, FailedExploration};
use super::prompts;
use super::state::Phase;
use super::PhaseContext;
use crate::analysis::{extension, go, push_unique};
use crate::coordinator::{ConcurrencyClass, TaskCoordinator, WorkItem};
use crate::repo::{top_level_dirs, walk_files, RepoEntry, RepositoryReader};
use crate::types::{DirectoryNode, FileClassification, FileType};
use anyhow::{Context, Result};
use docs_agent_sdk::log_finding;
use tracing::{debug, info, warn};

const TREE_DEPTH: usize = 3;

const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "go", "rs", "rb", "php", "cs", "cpp", "c", "swift",
    "kt", "scala",
];
const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "cfg", "env", "conf"];
const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt"];
const DOC_NAMES: &[&str] = &["readme", "changelog", "license", "contributing"];
const DATA_EXTENSIONS: &[&str] = &["sql", "csv", "parquet", "sqlite", "db"];
const BUILD_NAMES: &[&str] = &["makefile", "dockerfile", "jenkinsfile", "cmakelists.txt"];
const BUILD_EXTENSIONS: &[&str] = &["mk", "cmake"];

/// Anything else ranks at importance 3
const KNOWN_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "go", "rs", "rb", "php", "cs", "cpp", "c", "h", "hpp",
    "swift", "kt", "scala", "md", "json", "yaml", "yml", "toml", "sql", "sh", "bash", "zsh",
    "dockerfile", "tf",
];

const ENTRY_CANDIDATES: &[&str] = &[
    "main.py", "app.py", "server.py", "index.py", "run.py", "src/main.py", "src/index.py",
    "src/app.py", "main.js", "index.js", "app.js", "server.js", "src/main.js", "src/index.js",
    "src/app.js", "main.ts", "index.ts", "app.ts", "src/main.ts", "src/index.ts",
];

const PATTERN_KEYWORDS: &[&str] = &[
    "pattern", "factory", "singleton", "observer", "mvc", "repository", "service",
];

pub(crate) async fn discover(ctx: &PhaseContext) -> Result<DiscoveryDocument> {
    let reader = ctx.reader.as_ref();
    let should_descend = |name: &str| ctx.config.should_descend(name);
    let repository_name = ctx.config.repository_name();

    let entries = walk_files(reader, &should_descend).context("Failed to walk repository")?;
    let files: Vec<FileClassification> = entries.iter().map(classify_file).collect();
    info!(files = files.len(), "Classified repository files");

    let (languages, mut frameworks, entry_points) = detect_stack(reader, &files);
    let directory_structure = directory_tree(reader, &repository_name, &should_descend);

    let mut areas = vec![".".to_string()];
    areas.extend(
        top_level_dirs(reader, &should_descend).context("Failed to list top-level directories")?,
    );
    areas.truncate(ctx.config.max_explored_dirs.max(1));

    let exploration = match &ctx.coordinator {
        Some(coordinator) => explore(ctx, coordinator, &areas, &files).await,
        None => explore_locally(&areas, &files),
    };

    for pattern in &exploration.patterns {
        log_finding!(ctx.observer, Phase::Discovery.index(), "Pattern mentioned: {}", pattern);
        push_unique(&mut frameworks, format!("{} Pattern", pattern));
    }

    let summary = match &ctx.coordinator {
        Some(coordinator) => {
            let work = prompts::discovery_summary(
                &repository_name,
                &languages,
                &frameworks,
                &exploration.insights,
            );
            let item =
                WorkItem::new("discovery_summary", work).with_class(ConcurrencyClass::Discovery);
            coordinator
                .run_single(item)
                .await
                .into_result()
                .map_err(anyhow::Error::msg)
                .context("Failed to synthesize repository summary")?
                .to_text()
        }
        None => local_summary(&repository_name, &files, &languages, &frameworks, &entry_points),
    };
    ctx.persist(Phase::Discovery, &exploration, "Directory exploration insights")
        .await?;

    let go_module = reader.read("go.mod").ok().and_then(|text| go::module_path(&text));

    Ok(DiscoveryDocument {
        repository_path: ctx.config.repository.display().to_string(),
        repository_name,
        total_files: files.len(),
        files,
        directory_structure,
        detected_languages: languages,
        detected_frameworks: frameworks,
        entry_points,
        go_module,
        summary,
    })
}

/// File type, language and importance from the path alone
pub fn classify_file(entry: &RepoEntry) -> FileClassification {
    let name = entry.name().to_lowercase();
    let ext = extension(&name).unwrap_or_default();
    let ext = ext.as_str();
    let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
    let is_test_name = name.contains("test") || name.contains("spec");

    let file_type = if SOURCE_EXTENSIONS.contains(&ext) {
        FileType::SourceCode
    } else if CONFIG_EXTENSIONS.contains(&ext) {
        FileType::Config
    } else if DOC_EXTENSIONS.contains(&ext) || DOC_NAMES.contains(&stem) {
        FileType::Documentation
    } else if is_test_name {
        FileType::Test
    } else if DATA_EXTENSIONS.contains(&ext) {
        FileType::Data
    } else if BUILD_NAMES.contains(&name.as_str()) || BUILD_EXTENSIONS.contains(&ext) {
        FileType::Build
    } else {
        FileType::Other
    };

    let importance = if ["main", "index", "app", "server", "__init__", "__main__"].contains(&stem) {
        9
    } else if ["setup", "config", "settings", "constants"].contains(&stem) {
        8
    } else if is_test_name {
        4
    } else if file_type == FileType::Documentation {
        6
    } else if file_type == FileType::Config {
        7
    } else if !KNOWN_EXTENSIONS.contains(&ext) {
        3
    } else {
        5
    };

    FileClassification {
        path: entry.path.clone(),
        file_type,
        language: language_for(ext).map(str::to_string),
        importance,
        size: entry.size,
    }
}

fn language_for(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "go" => "go",
        "rs" => "rust",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "cpp" => "cpp",
        "c" => "c",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "sh" | "bash" | "zsh" => "shell",
        _ => return None,
    })
}

/// Languages, frameworks and entry points from manifests, then file languages
fn detect_stack(
    reader: &dyn RepositoryReader,
    files: &[FileClassification],
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut languages = Vec::new();
    let mut frameworks = Vec::new();
    let mut entry_points = Vec::new();
    let exists = |path: &str| files.iter().any(|f| f.path == path);

    if let Ok(text) = reader.read("package.json") {
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(manifest) => {
                push_unique(&mut languages, "javascript");
                let has_dep = |name: &str| {
                    ["dependencies", "devDependencies"]
                        .iter()
                        .any(|table| manifest[*table].get(name).is_some())
                };
                for (dep, framework) in [
                    ("react", "React"),
                    ("vue", "Vue"),
                    ("express", "Express"),
                    ("next", "Next.js"),
                ] {
                    if has_dep(dep) {
                        push_unique(&mut frameworks, framework);
                    }
                }
                if has_dep("typescript") {
                    push_unique(&mut languages, "typescript");
                }
                if let Some(main) = manifest["main"].as_str() {
                    push_unique(&mut entry_points, main);
                }
            }
            Err(e) => debug!(error = %e, "Ignoring unparsable package.json"),
        }
    }

    if exists("requirements.txt") || exists("pyproject.toml") || exists("setup.py") {
        push_unique(&mut languages, "python");
        if let Ok(text) = reader.read("requirements.txt") {
            let text = text.to_lowercase();
            for (needle, framework) in [
                ("django", "Django"),
                ("flask", "Flask"),
                ("fastapi", "FastAPI"),
                ("torch", "PyTorch"),
                ("tensorflow", "TensorFlow"),
            ] {
                if text.contains(needle) {
                    push_unique(&mut frameworks, framework);
                }
            }
        }
    }

    for candidate in ENTRY_CANDIDATES {
        if exists(candidate) {
            push_unique(&mut entry_points, *candidate);
        }
    }
    if exists("go.mod") {
        push_unique(&mut languages, "go");
        if exists("main.go") {
            push_unique(&mut entry_points, "main.go");
        }
    }
    if exists("Cargo.toml") {
        push_unique(&mut languages, "rust");
        if exists("src/main.rs") {
            push_unique(&mut entry_points, "src/main.rs");
        }
    }

    for language in files.iter().filter_map(|f| f.language.as_deref()) {
        push_unique(&mut languages, language);
    }
    (languages, frameworks, entry_points)
}

fn directory_tree(
    reader: &dyn RepositoryReader,
    root_name: &str,
    should_descend: &dyn Fn(&str) -> bool,
) -> DirectoryNode {
    let mut root = DirectoryNode {
        name: root_name.to_string(),
        is_dir: true,
        ..Default::default()
    };
    fill_tree(reader, "", 1, &mut root, should_descend);
    root
}

fn fill_tree(
    reader: &dyn RepositoryReader,
    dir: &str,
    depth: usize,
    node: &mut DirectoryNode,
    should_descend: &dyn Fn(&str) -> bool,
) {
    if depth > TREE_DEPTH {
        node.truncated = true;
        return;
    }
    let entries = match reader.list(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir, error = %e, "Skipping unreadable directory");
            return;
        }
    };
    for entry in entries.iter().filter(|e| !e.name().starts_with('.')) {
        let mut child = DirectoryNode {
            name: entry.name().to_string(),
            is_dir: entry.is_dir,
            ..Default::default()
        };
        if entry.is_dir {
            if !should_descend(entry.name()) {
                continue;
            }
            fill_tree(reader, &entry.path, depth + 1, &mut child, should_descend);
        }
        node.children.push(child);
    }
}

fn in_area(area: &str, path: &str) -> bool {
    match area {
        "." => !path.contains('/'),
        dir => path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/')),
    }
}

fn files_in<'a>(area: &str, files: &'a [FileClassification]) -> Vec<&'a str> {
    files
        .iter()
        .map(|f| f.path.as_str())
        .filter(|path| in_area(area, path))
        .collect()
}

async fn explore(
    ctx: &PhaseContext,
    coordinator: &TaskCoordinator,
    areas: &[String],
    files: &[FileClassification],
) -> ExplorationReport {
    let items = areas
        .iter()
        .map(|area| {
            let listed: Vec<&str> = files_in(area, files).into_iter().take(50).collect();
            WorkItem::new(
                format!("explore_{}", area),
                prompts::explore_directory(area, &listed),
            )
        })
        .collect();
    let outcomes = ctx.batch(coordinator, ConcurrencyClass::Discovery, items).await;

    let mut report = ExplorationReport::default();
    for (area, outcome) in areas.iter().zip(outcomes) {
        match outcome.into_result() {
            Ok(output) => report.insights.push(AreaInsight {
                area: area.clone(),
                analysis: output.to_text(),
            }),
            Err(error) => {
                warn!(area = %area, error = %error, "Directory exploration failed");
                report.failed_explorations.push(FailedExploration {
                    area: area.clone(),
                    error,
                });
            }
        }
    }
    report.patterns = mentioned_patterns(&report.insights);
    info!(
        succeeded = report.insights.len(),
        failed = report.failed_explorations.len(),
        "Explorations reconciled"
    );
    report
}

fn explore_locally(areas: &[String], files: &[FileClassification]) -> ExplorationReport {
    let insights = areas
        .iter()
        .map(|area| {
            let members: Vec<&FileClassification> = files
                .iter()
                .filter(|f| in_area(area, &f.path))
                .collect();
            let mut languages: Vec<String> = Vec::new();
            for language in members.iter().filter_map(|f| f.language.as_deref()) {
                push_unique(&mut languages, language);
            }
            let key_files: Vec<&str> = {
                let mut ranked = members.clone();
                ranked.sort_by(|a, b| b.importance.cmp(&a.importance));
                ranked.iter().take(3).map(|f| f.path.as_str()).collect()
            };
            AreaInsight {
                area: area.clone(),
                analysis: format!(
                    "{} file(s) directly inside; languages: {}; key files: {}",
                    members.len(),
                    if languages.is_empty() { "none".to_string() } else { languages.join(", ") },
                    if key_files.is_empty() { "none".to_string() } else { key_files.join(", ") },
                ),
            }
        })
        .collect();
    ExplorationReport {
        insights,
        ..Default::default()
    }
}

/// Pattern keywords mentioned in any insight, title-cased
fn mentioned_patterns(insights: &[AreaInsight]) -> Vec<String> {
    let mut patterns = Vec::new();
    for insight in insights {
        let text = insight.analysis.to_lowercase();
        for keyword in PATTERN_KEYWORDS {
            if text.contains(keyword) {
                push_unique(&mut patterns, title_case(keyword));
            }
        }
    }
    patterns
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn local_summary(
    name: &str,
    files: &[FileClassification],
    languages: &[String],
    frameworks: &[String],
    entry_points: &[String],
) -> String {
    let source = files
        .iter()
        .filter(|f| f.file_type == FileType::SourceCode)
        .count();
    let tests = files.iter().filter(|f| f.file_type == FileType::Test).count();
    let kind = if languages.is_empty() {
        "software".to_string()
    } else {
        languages.join("/")
    };
    let mut summary = format!(
        "{} is a {} project with {} files ({} source, {} test).",
        name,
        kind,
        files.len(),
        source,
        tests
    );
    if !frameworks.is_empty() {
        summary.push_str(&format!(" It uses {}.", frameworks.join(", ")));
    }
    if !entry_points.is_empty() {
        summary.push_str(&format!(" Entry points: {}.", entry_points.join(", ")));
    }
    summary
}
