//! JavaScript and TypeScript extraction

use super::{block_end, brace_depth, cached, push_unique, split_top_level, strip_generics, Extractor, LineIndex};
use crate::types::{ClassRecord, FileRecord, FunctionRecord, ImportRef};
use regex::Regex;
use std::sync::OnceLock;

static IMPORT_FROM: OnceLock<Regex> = OnceLock::new();
static IMPORT_BARE: OnceLock<Regex> = OnceLock::new();
static REQUIRE: OnceLock<Regex> = OnceLock::new();
static CLASS: OnceLock<Regex> = OnceLock::new();
static INTERFACE: OnceLock<Regex> = OnceLock::new();
static METHOD: OnceLock<Regex> = OnceLock::new();
static FUNCTION: OnceLock<Regex> = OnceLock::new();
static ARROW: OnceLock<Regex> = OnceLock::new();
static EXPORT_DECL: OnceLock<Regex> = OnceLock::new();
static EXPORT_LIST: OnceLock<Regex> = OnceLock::new();
static CONSTANT: OnceLock<Regex> = OnceLock::new();

const NOT_METHODS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "function", "constructor"];

pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn extract(&self, text: &str) -> FileRecord {
        let lines = LineIndex::new(text);
        let mut record = FileRecord {
            imports: imports(text),
            ..Default::default()
        };

        let class_re = cached(
            &CLASS,
            r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w.]+)(?:<[^>{]*>)?)?(?:\s+implements\s+([\w.,\s<>]+?))?\s*\{",
        );
        for cap in class_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let mut bases = Vec::new();
            if let Some(base) = cap.get(2) {
                push_unique(&mut bases, base.as_str());
            }
            if let Some(list) = cap.get(3) {
                for base in split_top_level(list.as_str()) {
                    push_unique(&mut bases, strip_generics(&base));
                }
            }

            let open = whole.end() - 1;
            let body_end = block_end(text, open);
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: bases,
                methods: methods(&text[open..body_end], open, &lines),
                description: String::new(),
            });
        }

        let interface_re = cached(
            &INTERFACE,
            r"(?m)^(?:export\s+)?(?:declare\s+)?interface\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w.,\s<>]+?))?\s*\{",
        );
        for cap in interface_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let bases = cap
                .get(2)
                .map(|list| {
                    split_top_level(list.as_str())
                        .iter()
                        .map(|b| strip_generics(b))
                        .collect()
                })
                .unwrap_or_default();
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: bases,
                methods: Vec::new(),
                description: "interface".to_string(),
            });
        }

        let function_re = cached(
            &FUNCTION,
            r"(?m)^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*(?:<[^>(]*>)?\s*\(([^)]*)\)(?:\s*:\s*([^{]+?))?\s*\{",
        );
        for cap in function_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            record.functions.push(FunctionRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                parameters: parameters(cap.get(2).map_or("", |m| m.as_str())),
                return_type: cap.get(3).map(|m| m.as_str().trim().to_string()),
                description: String::new(),
            });
        }

        let arrow_re = cached(
            &ARROW,
            r"(?m)^(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=\n]+)?=\s*(?:async\s+)?(?:\(([^)]*)\)|(\w+))\s*(?::\s*([^=\n]+?))?\s*=>",
        );
        for cap in arrow_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let params = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            record.functions.push(FunctionRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                parameters: parameters(params),
                return_type: cap.get(4).map(|m| m.as_str().trim().to_string()),
                description: String::new(),
            });
        }
        record.functions.sort_by_key(|f| f.line_number);

        let export_re = cached(
            &EXPORT_DECL,
            r"(?m)^export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:const|let|var|function\*?|class|async\s+function|interface|type|enum)\s+(\w+)",
        );
        for cap in export_re.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                push_unique(&mut record.exports, name.as_str());
            }
        }
        let export_list_re = cached(&EXPORT_LIST, r"(?m)^export\s*\{([^}]*)\}");
        for cap in export_list_re.captures_iter(text) {
            let Some(list) = cap.get(1) else { continue };
            for item in list.as_str().split(',') {
                // `a as b` exports `b`
                if let Some(name) = item.split_whitespace().last() {
                    push_unique(&mut record.exports, name);
                }
            }
        }

        let constant_re = cached(
            &CONSTANT,
            r"(?m)^(?:export\s+)?const\s+([A-Z][A-Z0-9_]+)\s*(?::[^=\n]+)?=",
        );
        for cap in constant_re.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                push_unique(&mut record.constants, name.as_str());
            }
        }

        record
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Path aliases like `@/lib` or `~/lib` point into the project itself
fn is_external(specifier: &str) -> bool {
    !(is_relative(specifier)
        || specifier.starts_with('/')
        || specifier.starts_with("@/")
        || specifier.starts_with("~/"))
}

fn import_ref(module: &str, names: Vec<String>) -> ImportRef {
    ImportRef {
        module: module.to_string(),
        names,
        is_relative: is_relative(module),
        is_external: is_external(module),
    }
}

fn named_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|item| item.trim().trim_start_matches("type "))
        .filter_map(|item| item.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn imports(text: &str) -> Vec<ImportRef> {
    let mut found: Vec<(usize, ImportRef)> = Vec::new();

    let from_re = cached(
        &IMPORT_FROM,
        r#"import\s+(?:type\s+)?(?:(\w+)\s*,?\s*)?(?:\{([^}]*)\}|\*\s+as\s+(\w+))?\s*from\s+['"]([^'"]+)['"]"#,
    );
    for cap in from_re.captures_iter(text) {
        let (Some(whole), Some(module)) = (cap.get(0), cap.get(4)) else {
            continue;
        };
        let mut names = Vec::new();
        if let Some(default) = cap.get(1) {
            names.push(default.as_str().to_string());
        }
        if let Some(list) = cap.get(2) {
            names.extend(named_list(list.as_str()));
        }
        if let Some(namespace) = cap.get(3) {
            names.push(namespace.as_str().to_string());
        }
        found.push((whole.start(), import_ref(module.as_str(), names)));
    }

    let bare_re = cached(&IMPORT_BARE, r#"(?m)^import\s+['"]([^'"]+)['"]"#);
    for cap in bare_re.captures_iter(text) {
        let (Some(whole), Some(module)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        found.push((whole.start(), import_ref(module.as_str(), Vec::new())));
    }

    let require_re = cached(
        &REQUIRE,
        r#"(?:const|let|var)\s+(?:\{([^}]*)\}|(\w+))\s*=\s*require\(\s*['"]([^'"]+)['"]\s*\)"#,
    );
    for cap in require_re.captures_iter(text) {
        let (Some(whole), Some(module)) = (cap.get(0), cap.get(3)) else {
            continue;
        };
        let names = match (cap.get(1), cap.get(2)) {
            (Some(list), _) => named_list(list.as_str()),
            (None, Some(name)) => vec![name.as_str().to_string()],
            _ => Vec::new(),
        };
        found.push((whole.start(), import_ref(module.as_str(), names)));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, import)| import).collect()
}

fn methods(body: &str, offset: usize, lines: &LineIndex) -> Vec<FunctionRecord> {
    let method_re = cached(
        &METHOD,
        r"(?m)^[ \t]+(?:(?:public|private|protected|static|readonly|override|abstract)\s+)*(?:async\s+)?\*?(#?\w+)\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
    );
    method_re
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?.as_str();
            if NOT_METHODS.contains(&name) || brace_depth(&body[..whole.start()]) != 1 {
                return None;
            }
            Some(FunctionRecord {
                name: name.to_string(),
                line_number: lines.line(offset + whole.start()),
                parameters: parameters(cap.get(2).map_or("", |m| m.as_str())),
                return_type: cap.get(3).map(|m| m.as_str().trim().to_string()),
                description: String::new(),
            })
        })
        .collect()
}

/// Parameter names without types, defaults or destructuring braces
fn parameters(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .map(|p| {
            let name = p.split([':', '=']).next().unwrap_or("");
            name.trim().trim_end_matches('?').to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}
