//! Rust extraction
//!
//! Structs, enums, traits and unions are recorded as classes. Methods come
//! from `impl` blocks, and `impl Trait for Type` lists `Trait` as a base of
//! `Type` so the dependency graph can draw `extends` edges for it.

use super::{block_end, cached, push_unique, split_top_level, strip_generics, Extractor, LineIndex};
use crate::types::{ClassRecord, FileRecord, FunctionRecord, ImportRef};
use regex::Regex;
use std::sync::OnceLock;

static USE: OnceLock<Regex> = OnceLock::new();
static MOD: OnceLock<Regex> = OnceLock::new();
static TYPE: OnceLock<Regex> = OnceLock::new();
static IMPL: OnceLock<Regex> = OnceLock::new();
static METHOD: OnceLock<Regex> = OnceLock::new();
static FUNCTION: OnceLock<Regex> = OnceLock::new();
static CONSTANT: OnceLock<Regex> = OnceLock::new();

pub struct RustExtractor;

impl Extractor for RustExtractor {
    fn extract(&self, text: &str) -> FileRecord {
        let lines = LineIndex::new(text);
        let mut record = FileRecord {
            imports: imports(text),
            ..Default::default()
        };

        let type_re = cached(
            &TYPE,
            r"(?m)^[ \t]*(pub(?:\([^)]*\))?\s+)?(struct|enum|trait|union)\s+(\w+)(?:<.*?>)?(?:\s*:\s*([^{;]+?))?\s*(?:where[^{;]*)?[{;(]",
        );
        for cap in type_re.captures_iter(text) {
            let (Some(whole), Some(kind), Some(name)) = (cap.get(0), cap.get(2), cap.get(3)) else {
                continue;
            };
            let bases = match (kind.as_str(), cap.get(4)) {
                ("trait", Some(supertraits)) => supertraits
                    .as_str()
                    .split('+')
                    .map(strip_generics)
                    .filter(|b| !b.is_empty() && !b.starts_with('\''))
                    .collect(),
                _ => Vec::new(),
            };
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: bases,
                methods: Vec::new(),
                description: kind.as_str().to_string(),
            });
            if is_public(cap.get(1)) {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        let impl_re = cached(
            &IMPL,
            r"(?m)^[ \t]*(?:unsafe\s+)?impl(?:<.*?>)?\s+(?:!?([\w:]+)(?:<.*?>)?\s+for\s+)?([\w:]+)(?:<.*?>)?\s*(?:where[^{]*)?\{",
        );
        for cap in impl_re.captures_iter(text) {
            let (Some(whole), Some(target)) = (cap.get(0), cap.get(2)) else {
                continue;
            };
            let target = last_segment(target.as_str());
            let Some(class) = record.classes.iter_mut().find(|c| c.name == target) else {
                continue;
            };
            if let Some(trait_name) = cap.get(1) {
                push_unique(&mut class.base_classes, last_segment(trait_name.as_str()));
            }
            let open = whole.end() - 1;
            let body = &text[open..block_end(text, open)];
            class.methods.extend(methods(body, open, &lines));
        }

        let function_re = cached(
            &FUNCTION,
            r#"(?m)^(pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)(?:<.*?>)?\s*\(([^)]*)\)(?:\s*->\s*([^{;]+?))?\s*(?:where[^{]*)?\{"#,
        );
        for cap in function_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(2)) else {
                continue;
            };
            record.functions.push(FunctionRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                parameters: parameters(cap.get(3).map_or("", |m| m.as_str())),
                return_type: cap.get(4).map(|m| m.as_str().trim().to_string()),
                description: String::new(),
            });
            if is_public(cap.get(1)) {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        let constant_re = cached(
            &CONSTANT,
            r"(?m)^(pub(?:\([^)]*\))?\s+)?(?:const|static)\s+(?:mut\s+)?([A-Z][A-Z0-9_]*)\s*:",
        );
        for cap in constant_re.captures_iter(text) {
            let Some(name) = cap.get(2) else { continue };
            push_unique(&mut record.constants, name.as_str());
            if is_public(cap.get(1)) {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        record
    }
}

/// Plain `pub` only; `pub(crate)` and friends stay internal
fn is_public(visibility: Option<regex::Match<'_>>) -> bool {
    visibility.is_some_and(|m| m.as_str().trim() == "pub")
}

fn last_segment(path: &str) -> String {
    strip_generics(path.rsplit("::").next().unwrap_or(path))
}

fn is_relative(path: &str) -> bool {
    path == "self" || path == "super" || path.starts_with("self::") || path.starts_with("super::")
}

fn is_internal(path: &str) -> bool {
    matches!(
        path.split("::").next(),
        Some("crate") | Some("self") | Some("super")
    )
}

fn imports(text: &str) -> Vec<ImportRef> {
    let mut found: Vec<(usize, ImportRef)> = Vec::new();

    let use_re = cached(&USE, r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?use\s+([^;]+);");
    for cap in use_re.captures_iter(text) {
        let (Some(whole), Some(tree)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let tree: String = tree.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
        let tree = tree.trim_start_matches("::");
        let (module, names) = split_use_tree(tree);
        found.push((
            whole.start(),
            ImportRef {
                is_relative: is_relative(&module),
                is_external: !is_internal(&module),
                module,
                names,
            },
        ));
    }

    let mod_re = cached(&MOD, r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;");
    for cap in mod_re.captures_iter(text) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        found.push((
            whole.start(),
            ImportRef {
                module: name.as_str().to_string(),
                names: Vec::new(),
                is_relative: true,
                is_external: false,
            },
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, import)| import).collect()
}

/// `a::b::{C, D}` splits into `a::b` and `[C, D]`; `a::b::C` into `a::b` and `[C]`
fn split_use_tree(tree: &str) -> (String, Vec<String>) {
    if let Some(idx) = tree.find("::{") {
        let list = tree[idx + 3..].trim_end_matches('}');
        let names = split_top_level(list)
            .into_iter()
            .map(|item| item.split(" as ").next().unwrap_or("").trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return (tree[..idx].to_string(), names);
    }

    let path = tree.split(" as ").next().unwrap_or(tree).trim();
    match path.rsplit_once("::") {
        Some((module, item)) => (module.to_string(), vec![item.to_string()]),
        None => (path.to_string(), Vec::new()),
    }
}

fn methods(body: &str, offset: usize, lines: &LineIndex) -> Vec<FunctionRecord> {
    let method_re = cached(
        &METHOD,
        r#"(?m)^[ \t]+(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)(?:<.*?>)?\s*\(([^)]*)\)(?:\s*->\s*([^{;]+?))?\s*(?:where[^{;]*)?[{;]"#,
    );
    method_re
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(FunctionRecord {
                name: cap.get(1)?.as_str().to_string(),
                line_number: lines.line(offset + whole.start()),
                parameters: parameters(cap.get(2).map_or("", |m| m.as_str())),
                return_type: cap.get(3).map(|m| m.as_str().trim().to_string()),
                description: String::new(),
            })
        })
        .collect()
}

/// Binding names, receivers excluded
fn parameters(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .filter_map(|p| {
            let binding = p.split(':').next().unwrap_or("").trim();
            let binding = binding.trim_start_matches("mut ").trim();
            // self, &self, &mut self, &'a self
            let is_receiver = binding
                .split_whitespace()
                .last()
                .is_some_and(|t| t.trim_start_matches('&') == "self");
            if binding.is_empty() || is_receiver {
                None
            } else {
                Some(binding.to_string())
            }
        })
        .collect()
}
