//! Architecture pattern keywords from module and file names

use crate::types::{FileRecord, ModuleRecord};

const SINGLETON_MARKERS: &[&str] = &["instance", "get_instance", "getinstance"];

/// Detected patterns, deduplicated, in detection order
pub fn detect_architecture_patterns(modules: &[ModuleRecord], files: &[FileRecord]) -> Vec<String> {
    let module_names: Vec<String> = modules.iter().map(|m| m.name.to_lowercase()).collect();
    let file_names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().to_lowercase())
        .collect();
    let any_name = |needles: &[&str]| {
        module_names
            .iter()
            .chain(file_names.iter())
            .any(|name| needles.iter().any(|n| name.contains(n)))
    };

    let mut patterns: Vec<&str> = Vec::new();

    if any_name(&["model"]) && any_name(&["view"]) && any_name(&["controller"]) {
        patterns.push("MVC (Model-View-Controller)");
    }

    let has_api = any_name(&["api", "route"]);
    let has_service = any_name(&["service"]);
    let has_repository = any_name(&["repository", "repo", "dao"]);
    if has_api && (has_service || has_repository) {
        patterns.push("Layered Architecture");
    }
    if has_repository {
        patterns.push("Repository Pattern");
    }

    let symbol_names = || {
        files.iter().flat_map(|f| {
            f.functions
                .iter()
                .map(|func| func.name.to_lowercase())
                .chain(f.classes.iter().flat_map(|c| {
                    std::iter::once(c.name.to_lowercase())
                        .chain(c.methods.iter().map(|m| m.name.to_lowercase()))
                }))
        })
    };
    if symbol_names().any(|name| name.contains("factory")) {
        patterns.push("Factory Pattern");
    }
    if symbol_names().any(|name| SINGLETON_MARKERS.iter().any(|m| name.contains(m))) {
        patterns.push("Singleton Pattern");
    }

    if any_name(&["cli", "command"]) {
        patterns.push("CLI Application");
    }
    if file_names
        .iter()
        .any(|name| ["route", "handler", "endpoint"].iter().any(|n| name.contains(n)))
    {
        patterns.push("Web Application");
    }

    let mut unique: Vec<String> = Vec::new();
    for pattern in patterns {
        if !unique.iter().any(|p| p == pattern) {
            unique.push(pattern.to_string());
        }
    }
    unique
}
