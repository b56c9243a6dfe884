//! Directory-based module identification

use crate::analysis::{LanguageFamily, UNKNOWN_PURPOSE};
use crate::types::{FileRecord, ModuleRecord};
use std::collections::{HashMap, HashSet};

pub const MAX_PUBLIC_API: usize = 20;
pub const MAX_INTERNAL_COMPONENTS: usize = 10;

/// Root-level stray files below this count are not promoted to a module
const MIN_ROOT_FILES: usize = 3;

const ROOT_DIR: &str = ".";

#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleIdentifier;

impl ModuleIdentifier {
    pub fn identify(&self, records: &[FileRecord]) -> Vec<ModuleRecord> {
        identify_modules(records)
    }
}

/// Group records by containing directory, in first-seen order
pub fn identify_modules(records: &[FileRecord]) -> Vec<ModuleRecord> {
    let mut groups: Vec<(&str, Vec<&FileRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let dir = record.directory();
        match index.get(dir) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                index.insert(dir, groups.len());
                groups.push((dir, vec![record]));
            }
        }
    }

    let mut taken = HashSet::new();
    groups
        .into_iter()
        .filter(|(dir, files)| !(*dir == ROOT_DIR && files.len() < MIN_ROOT_FILES))
        .map(|(dir, files)| {
            let name = unique_name(module_name(dir), &mut taken);
            build_module(name, dir, &files)
        })
        .collect()
}

fn module_name(dir: &str) -> String {
    if dir == ROOT_DIR {
        "root".to_string()
    } else {
        dir.replace('/', ".")
    }
}

/// `a/b` and `a.b` both dot to `a.b`; later groups get `_2`, `_3`, ...
fn unique_name(base: String, taken: &mut HashSet<String>) -> String {
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{}_{}", base, n);
        n += 1;
    }
    name
}

fn build_module(name: String, dir: &str, files: &[&FileRecord]) -> ModuleRecord {

    let mut public_api = Vec::new();
    let mut internal_components = Vec::new();
    for file in files {
        let family = LanguageFamily::detect(file.language.as_deref(), &file.path);
        for export in &file.exports {
            let entry = format!("{}:{}", file.path, export);
            if family.is_private(export) {
                internal_components.push(entry);
            } else {
                public_api.push(entry);
            }
        }
    }
    public_api.truncate(MAX_PUBLIC_API);
    internal_components.truncate(MAX_INTERNAL_COMPONENTS);

    ModuleRecord {
        name,
        path: dir.to_string(),
        files: files.iter().map(|f| f.path.clone()).collect(),
        purpose: dominant_purpose(files)
            .unwrap_or_else(|| format!("Module containing {} files", files.len())),
        public_api,
        internal_components,
    }
}

/// Most frequent known purpose; ties go to whichever appeared first
fn dominant_purpose(files: &[&FileRecord]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for file in files {
        let purpose = file.purpose.trim();
        if purpose.is_empty() || purpose.eq_ignore_ascii_case(UNKNOWN_PURPOSE) {
            continue;
        }
        match counts.iter_mut().find(|(p, _)| *p == purpose) {
            Some((_, count)) => *count += 1,
            None => counts.push((purpose, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (purpose, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((purpose, count));
        }
    }
    best.map(|(purpose, _)| purpose.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, purpose: &str, exports: &[&str]) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            purpose: purpose.to_string(),
            exports: exports.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_small_root_is_not_a_module() {
        let records = vec![
            record("setup.py", "Configuration", &[]),
            record("main.py", "Application entry point", &[]),
            record("pkg/a.py", "unknown", &[]),
            record("pkg/b.py", "unknown", &[]),
            record("pkg/c.py", "unknown", &[]),
        ];
        let modules = identify_modules(&records);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "pkg");
        assert_eq!(modules[0].files, vec!["pkg/a.py", "pkg/b.py", "pkg/c.py"]);
        assert_eq!(modules[0].purpose, "Module containing 3 files");
    }

    #[test]
    fn test_three_root_files_become_root_module() {
        let records = vec![
            record("a.py", "Test file", &[]),
            record("b.py", "Configuration", &[]),
            record("c.py", "Configuration", &[]),
        ];
        let modules = identify_modules(&records);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "root");
        assert_eq!(modules[0].path, ".");
        assert_eq!(modules[0].purpose, "Configuration");
    }

    #[test]
    fn test_nested_directories_use_dotted_names_in_first_seen_order() {
        let records = vec![
            record("src/api/routes.py", "API endpoints", &[]),
            record("src/core/engine.py", "defines 1 class(es)", &[]),
            record("src/api/auth.py", "API endpoints", &[]),
        ];
        let modules = identify_modules(&records);
        let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["src.api", "src.core"]);
        assert_eq!(modules[0].files.len(), 2);
    }

    #[test]
    fn test_colliding_directory_names_stay_unique() {
        let records = vec![
            record("a/b/x.py", "unknown", &[]),
            record("a.b/p.py", "unknown", &[]),
            record("a/b/y.py", "unknown", &[]),
        ];
        let modules = identify_modules(&records);
        let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.b", "a.b_2"]);
        assert_eq!(modules[0].path, "a/b");
        assert_eq!(modules[1].path, "a.b");
        assert_eq!(modules[1].files, vec!["a.b/p.py"]);
    }

    #[test]
    fn test_directory_named_root_does_not_shadow_root_module() {
        let records = vec![
            record("a.py", "unknown", &[]),
            record("root/main.py", "unknown", &[]),
            record("b.py", "unknown", &[]),
            record("c.py", "unknown", &[]),
        ];
        let modules = identify_modules(&records);
        let names: Vec<_> = modules.iter().map(|m| (m.name.as_str(), m.path.as_str())).collect();
        assert_eq!(names, vec![("root", "."), ("root_2", "root")]);
    }

    #[test]
    fn test_purpose_tie_breaks_on_first_occurrence() {
        let records = vec![
            record("m/a.py", "unknown", &[]),
            record("m/b.py", "Utility functions", &[]),
            record("m/c.py", "Data models", &[]),
            record("m/d.py", "Data models", &[]),
            record("m/e.py", "Utility functions", &[]),
        ];
        assert_eq!(identify_modules(&records)[0].purpose, "Utility functions");
    }

    #[test]
    fn test_public_and_internal_caps() {
        let many: Vec<String> = (0..25).map(|i| format!("item{}", i)).collect();
        let hidden: Vec<String> = (0..12).map(|i| format!("_hidden{}", i)).collect();
        let exports: Vec<&str> = many.iter().chain(hidden.iter()).map(String::as_str).collect();

        let records = vec![
            record("lib/a.py", "unknown", &exports),
            record("lib/b.py", "unknown", &[]),
            record("lib/c.py", "unknown", &[]),
        ];
        let module = &identify_modules(&records)[0];
        assert_eq!(module.public_api.len(), MAX_PUBLIC_API);
        assert_eq!(module.public_api[0], "lib/a.py:item0");
        assert_eq!(module.internal_components.len(), MAX_INTERNAL_COMPONENTS);
        assert_eq!(module.internal_components[0], "lib/a.py:_hidden0");
    }

    #[test]
    fn test_go_privacy_is_case_based() {
        let mut file = record("svc/store.go", "unknown", &["Open", "helper"]);
        file.language = Some("go".to_string());
        let module = &identify_modules(&[file])[0];
        assert_eq!(module.public_api, vec!["svc/store.go:Open"]);
        assert_eq!(module.internal_components, vec!["svc/store.go:helper"]);
    }
}
