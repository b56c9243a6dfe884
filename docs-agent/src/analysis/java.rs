//! Java extraction

use super::{
    block_end, brace_depth, cached, push_unique, split_top_level, strip_generics, Extractor,
    LineIndex,
};
use crate::types::{ClassRecord, FileRecord, FunctionRecord, ImportRef};
use regex::Regex;
use std::sync::OnceLock;

static PACKAGE: OnceLock<Regex> = OnceLock::new();
static IMPORT: OnceLock<Regex> = OnceLock::new();
static TYPE: OnceLock<Regex> = OnceLock::new();
static METHOD: OnceLock<Regex> = OnceLock::new();
static CONSTANT: OnceLock<Regex> = OnceLock::new();

/// Words that can sit where a return type is expected but never are one
const NOT_RETURN_TYPES: &[&str] = &[
    "return", "new", "throw", "else", "case", "yield", "public", "protected", "private", "static",
    "final", "abstract", "synchronized", "native", "default",
];

pub struct JavaExtractor;

impl Extractor for JavaExtractor {
    fn extract(&self, text: &str) -> FileRecord {
        let lines = LineIndex::new(text);
        let package = cached(&PACKAGE, r"(?m)^package\s+([\w.]+)\s*;")
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string());
        let mut record = FileRecord {
            imports: imports(text, package.as_deref()),
            ..Default::default()
        };

        let type_re = cached(
            &TYPE,
            r"(?m)^[ \t]*((?:(?:public|protected|private|abstract|final|static|sealed|non-sealed|strictfp)\s+)*)(class|interface|enum|record)\s+(\w+)(?:<.*?>)?(?:\s*\([^)]*\))?(?:\s+extends\s+([\w.<>, ?]+?))?(?:\s+implements\s+([\w.<>, ?]+?))?(?:\s+permits\s+[\w., ]+?)?\s*\{",
        );
        for cap in type_re.captures_iter(text) {
            let (Some(whole), Some(kind), Some(name)) = (cap.get(0), cap.get(2), cap.get(3)) else {
                continue;
            };
            let mut bases = Vec::new();
            for list in [cap.get(4), cap.get(5)].into_iter().flatten() {
                for base in split_top_level(list.as_str()) {
                    push_unique(&mut bases, strip_generics(&base));
                }
            }

            let open = whole.end() - 1;
            let body = &text[open..block_end(text, open)];
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: bases,
                methods: methods(body, open, &lines),
                description: kind.as_str().to_string(),
            });

            let modifiers = cap.get(1).map_or("", |m| m.as_str());
            if modifiers.split_whitespace().any(|m| m == "public") {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        let constant_re = cached(
            &CONSTANT,
            r"(?m)^[ \t]*(?:(?:public|protected|private)\s+)?(?:static\s+final|final\s+static)\s+[\w.<>\[\], ?]+?\s+([A-Z][A-Z0-9_]*)\s*=",
        );
        for cap in constant_re.captures_iter(text) {
            if let Some(name) = cap.get(1) {
                push_unique(&mut record.constants, name.as_str());
            }
        }

        record
    }
}

/// Imports sharing the first two package segments with this file are internal
fn imports(text: &str, package: Option<&str>) -> Vec<ImportRef> {
    let own_prefix: Option<Vec<&str>> = package
        .map(|p| p.split('.').take(2).collect())
        .filter(|segments: &Vec<&str>| segments.len() == 2);

    let import_re = cached(&IMPORT, r"(?m)^import\s+(static\s+)?([\w.]+?)(\.\*)?\s*;");
    import_re
        .captures_iter(text)
        .filter_map(|cap| {
            let path = cap.get(2)?.as_str();
            let is_static = cap.get(1).is_some();
            let wildcard = cap.get(3).is_some();

            let (module, names) = if wildcard {
                (path.to_string(), vec!["*".to_string()])
            } else if is_static {
                // `import static a.b.Type.member` refers to the type
                let (owner, member) = path.rsplit_once('.').unwrap_or((path, ""));
                (owner.to_string(), vec![member.to_string()])
            } else {
                let name = path.rsplit('.').next().unwrap_or(path);
                (path.to_string(), vec![name.to_string()])
            };

            let segments: Vec<&str> = module.split('.').take(2).collect();
            let is_internal = own_prefix.as_ref().is_some_and(|own| *own == segments);
            Some(ImportRef {
                module,
                names,
                is_relative: false,
                is_external: !is_internal,
            })
        })
        .collect()
}

fn methods(body: &str, offset: usize, lines: &LineIndex) -> Vec<FunctionRecord> {
    let method_re = cached(
        &METHOD,
        r"(?m)^[ \t]+(?:@\w+\s+)*((?:(?:public|protected|private|static|final|abstract|synchronized|native|default)\s+)*)(?:<[^>]*>\s+)?([\w.<>\[\], ?]+?)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w., ]+?)?\s*[{;]",
    );
    method_re
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let return_type = cap.get(2)?.as_str().trim();
            let first_word = return_type.split_whitespace().next().unwrap_or("");
            if NOT_RETURN_TYPES.contains(&first_word)
                || brace_depth(&body[..whole.start()]) != 1
            {
                return None;
            }
            Some(FunctionRecord {
                name: cap.get(3)?.as_str().to_string(),
                line_number: lines.line(offset + whole.start()),
                parameters: parameters(cap.get(4).map_or("", |m| m.as_str())),
                return_type: Some(return_type.to_string()),
                description: String::new(),
            })
        })
        .collect()
}

/// The last word of each parameter, annotations and `final` ignored
fn parameters(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .filter_map(|p| p.split_whitespace().last().map(str::to_string))
        .collect()
}
