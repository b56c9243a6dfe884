//! Import and inheritance edge resolution

use crate::analysis::LanguageFamily;
use crate::types::{DependencyEdge, EdgeKind, EdgeStrength, FileRecord, ImportRef};
use tracing::debug;

const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx"];

#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    pub fn build(&self, records: &[FileRecord]) -> Vec<DependencyEdge> {
        build_dependency_graph(records)
    }
}

/// Best-effort edges between analyzed files
///
/// Each relative or internal import resolves to the **first** other file (in
/// record order) whose extension-stripped path ends with or contains the
/// normalized reference. Each declared base class yields one `extends` edge
/// per class of that exact name found in another file. No deduplication.
pub fn build_dependency_graph(records: &[FileRecord]) -> Vec<DependencyEdge> {
    let stems: Vec<&str> = records.iter().map(|r| strip_extension(&r.path)).collect();
    let mut edges = Vec::new();

    for record in records {
        let family = LanguageFamily::detect(record.language.as_deref(), &record.path);

        for import in record.imports.iter().filter(|i| i.is_local()) {
            let Some(reference) = normalize_reference(import, family) else {
                debug!(
                    file = %record.path,
                    module = %import.module,
                    "Unresolvable import reference"
                );
                continue;
            };
            let target = records
                .iter()
                .zip(&stems)
                .find(|(other, stem)| {
                    other.path != record.path
                        && (stem.ends_with(reference.as_str()) || stem.contains(reference.as_str()))
                })
                .map(|(other, _)| other);
            if let Some(target) = target {
                edges.push(edge(record, target, EdgeKind::Imports, EdgeStrength::Normal));
            }
        }

        for base in record.classes.iter().flat_map(|c| &c.base_classes) {
            for other in records.iter().filter(|o| o.path != record.path) {
                for _ in other.classes.iter().filter(|c| &c.name == base) {
                    edges.push(edge(record, other, EdgeKind::Extends, EdgeStrength::Strong));
                }
            }
        }
    }

    edges
}

fn edge(
    source: &FileRecord,
    target: &FileRecord,
    kind: EdgeKind,
    strength: EdgeStrength,
) -> DependencyEdge {
    DependencyEdge {
        source: source.path.clone(),
        target: target.path.clone(),
        relationship: kind,
        strength,
    }
}

fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..name_start + dot],
        _ => path,
    }
}

/// Path-like form of an import reference, or `None` when nothing remains
///
/// Leading `./` and `../` segments are dropped; the rest depends on the
/// importing file's language (`a.b` and `a::b` both become `a/b`).
pub fn normalize_reference(import: &ImportRef, family: LanguageFamily) -> Option<String> {
    let mut module = import.module.trim();
    loop {
        if let Some(rest) = module.strip_prefix("./") {
            module = rest;
        } else if let Some(rest) = module.strip_prefix("../") {
            module = rest;
        } else {
            break;
        }
    }

    let normalized = match family {
        LanguageFamily::Python => module.trim_start_matches('.').replace('.', "/"),
        LanguageFamily::Java => module.replace('.', "/"),
        LanguageFamily::Rust => {
            let mut path = module;
            while let Some(rest) = ["crate::", "self::", "super::"]
                .iter()
                .find_map(|prefix| path.strip_prefix(prefix))
            {
                path = rest;
            }
            if matches!(path, "crate" | "self" | "super") {
                path = "";
            }
            path.replace("::", "/")
        }
        LanguageFamily::JavaScript => {
            let path = module
                .strip_prefix("@/")
                .or_else(|| module.strip_prefix("~/"))
                .unwrap_or(module);
            let path = SCRIPT_EXTENSIONS
                .iter()
                .find_map(|ext| path.strip_suffix(ext))
                .unwrap_or(path);
            path.to_string()
        }
        // Module imports arrive repository-relative; anything still
        // domain-qualified cannot name a local file
        LanguageFamily::Go if module.split('/').next().is_some_and(|s| s.contains('.')) => {
            return None
        }
        LanguageFamily::Go => module.to_string(),
        LanguageFamily::Unknown => module.replace('.', "/"),
    };

    let normalized = normalized.trim_matches('/').to_string();
    (!normalized.is_empty()).then_some(normalized)
}
