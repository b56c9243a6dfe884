//! Python extraction

use super::{cached, push_unique, split_top_level, Extractor, LineIndex};
use crate::types::{ClassRecord, FileRecord, FunctionRecord, ImportRef};
use regex::Regex;
use std::sync::OnceLock;

static IMPORT: OnceLock<Regex> = OnceLock::new();
static FROM_IMPORT: OnceLock<Regex> = OnceLock::new();
static CLASS: OnceLock<Regex> = OnceLock::new();
static FUNCTION: OnceLock<Regex> = OnceLock::new();
static METHOD: OnceLock<Regex> = OnceLock::new();
static CONSTANT: OnceLock<Regex> = OnceLock::new();
static TOP_LEVEL: OnceLock<Regex> = OnceLock::new();

pub struct PythonExtractor;

impl Extractor for PythonExtractor {
    fn extract(&self, text: &str) -> FileRecord {
        let lines = LineIndex::new(text);
        let mut record = FileRecord {
            imports: imports(text),
            ..Default::default()
        };

        let class_re = cached(&CLASS, r"(?m)^class\s+(\w+)\s*(?:\(([^)]*)\))?\s*:");
        for cap in class_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let bases = cap
                .get(2)
                .map(|b| {
                    split_top_level(b.as_str())
                        .into_iter()
                        .filter(|base| !base.contains('='))
                        .collect()
                })
                .unwrap_or_default();

            let body_start = whole.end();
            let body = &text[body_start..body_end(text, body_start)];
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: bases,
                methods: methods(body, body_start, &lines),
                description: docstring(body).unwrap_or_default(),
            });
            push_unique(&mut record.exports, name.as_str());
        }

        let function_re = cached(
            &FUNCTION,
            r"(?m)^(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*([^:]+?))?\s*:",
        );
        for cap in function_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let name = name.as_str();
            record.functions.push(FunctionRecord {
                name: name.to_string(),
                line_number: lines.line(whole.start()),
                parameters: parameters(cap.get(2).map_or("", |m| m.as_str()), false),
                return_type: cap.get(3).map(|m| m.as_str().trim().to_string()),
                description: docstring(&text[whole.end()..]).unwrap_or_default(),
            });
            if !name.starts_with('_') {
                push_unique(&mut record.exports, name);
            }
        }

        let constant_re = cached(&CONSTANT, r"(?m)^([A-Z][A-Z0-9_]+)\s*(?::[^=\n]+)?=[^=]");
        for cap in constant_re.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                push_unique(&mut record.constants, name.as_str());
            }
        }

        record
    }
}

fn imports(text: &str) -> Vec<ImportRef> {
    let mut imports = Vec::new();

    let import_re = cached(&IMPORT, r"(?m)^import\s+([^\n#;]+)");
    for cap in import_re.captures_iter(text) {
        let Some(list) = cap.get(1) else { continue };
        for part in list.as_str().split(',') {
            let module = part.split_whitespace().next().unwrap_or("");
            if module.is_empty() {
                continue;
            }
            imports.push(ImportRef {
                module: module.to_string(),
                names: Vec::new(),
                is_relative: false,
                // Dotted absolute imports are treated as project packages
                is_external: !module.contains('.'),
            });
        }
    }

    let from_re = cached(
        &FROM_IMPORT,
        r"(?m)^from\s+(\S+)\s+import\s+(?:\(([^)]*)\)|([^\n#;]+))",
    );
    for cap in from_re.captures_iter(text) {
        let Some(module) = cap.get(1) else { continue };
        let module = module.as_str();
        let list = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
        let names = list
            .split(',')
            .filter_map(|n| n.split_whitespace().next())
            .filter(|n| *n != "\\")
            .map(str::to_string)
            .collect();
        let is_relative = module.starts_with('.');
        imports.push(ImportRef {
            module: module.to_string(),
            names,
            is_relative,
            is_external: !is_relative,
        });
    }

    imports
}

/// End of an indented block: the next non-blank line starting at column 0
fn body_end(text: &str, from: usize) -> usize {
    let top_level = cached(&TOP_LEVEL, r"(?m)^[^\s#]");
    // Skip the rest of the header line first
    let start = text[from..].find('\n').map_or(text.len(), |i| from + i);
    top_level
        .find_at(text, start)
        .map_or(text.len(), |m| m.start())
}

fn methods(body: &str, offset: usize, lines: &LineIndex) -> Vec<FunctionRecord> {
    let method_re = cached(
        &METHOD,
        r"(?m)^[ \t]+(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*([^:]+?))?\s*:",
    );
    method_re
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(FunctionRecord {
                name: cap.get(1)?.as_str().to_string(),
                line_number: lines.line(offset + whole.start()),
                parameters: parameters(cap.get(2).map_or("", |m| m.as_str()), true),
                return_type: cap.get(3).map(|m| m.as_str().trim().to_string()),
                description: docstring(&body[whole.end()..]).unwrap_or_default(),
            })
        })
        .collect()
}

/// Parameter names with annotations and defaults stripped
fn parameters(list: &str, is_method: bool) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .map(|p| {
            let name = p.split([':', '=']).next().unwrap_or("");
            name.trim().to_string()
        })
        .filter(|p| !p.is_empty() && *p != "/" && *p != "*")
        .filter(|p| !(is_method && (p == "self" || p == "cls")))
        .collect()
}

/// First line of a docstring directly following a header
fn docstring(after_header: &str) -> Option<String> {
    let rest = after_header.trim_start();
    let quote = ["\"\"\"", "'''"].into_iter().find(|q| rest.starts_with(q))?;
    let inner = &rest[quote.len()..];
    let end = inner.find(quote).unwrap_or(inner.len());
    inner[..end]
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
