//! Pattern-based source extraction
//!
//! [`LocalAnalyzer`] derives a [`FileRecord`] from raw source text without any
//! capability call. It is deterministic, never fails, and is what every phase
//! falls back to when a provider is absent or a call fails.
//!
//! Each language family has its own small [`Extractor`] in a sibling module:
//! - **python**: `import`/`from`, `class`, `def`, upper-case constants
//! - **javascript**: ES modules, `require`, classes, interfaces, functions, arrows
//! - **rust**: `use`/`mod`, structs/enums/traits, `impl` methods, `fn`
//! - **go**: import blocks, struct/interface types, funcs and receivers
//! - **java**: imports, classes/interfaces/enums/records, methods

pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;

use crate::types::{ComplexityScore, FileRecord};
use regex::Regex;
use std::sync::OnceLock;

/// Supported extraction families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    Python,
    /// JavaScript and TypeScript
    JavaScript,
    Rust,
    Go,
    Java,
    Unknown,
}

impl LanguageFamily {
    pub fn from_language(language: &str) -> Self {
        match language.to_ascii_lowercase().as_str() {
            "python" | "py" => Self::Python,
            "javascript" | "typescript" | "js" | "ts" | "jsx" | "tsx" => Self::JavaScript,
            "rust" | "rs" => Self::Rust,
            "go" | "golang" => Self::Go,
            "java" => Self::Java,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &str) -> Self {
        match extension(path).as_deref() {
            Some("py") | Some("pyi") => Self::Python,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") | Some("ts") | Some("tsx") => {
                Self::JavaScript
            }
            Some("rs") => Self::Rust,
            Some("go") => Self::Go,
            Some("java") => Self::Java,
            _ => Self::Unknown,
        }
    }

    /// Family from an explicit hint, falling back to the file extension
    pub fn detect(hint: Option<&str>, path: &str) -> Self {
        match hint.map(Self::from_language) {
            Some(family) if family != Self::Unknown => family,
            _ => Self::from_path(path),
        }
    }

    pub fn extractor(self) -> Option<&'static dyn Extractor> {
        match self {
            Self::Python => Some(&python::PythonExtractor),
            Self::JavaScript => Some(&javascript::JavaScriptExtractor),
            Self::Rust => Some(&rust::RustExtractor),
            Self::Go => Some(&go::GoExtractor),
            Self::Java => Some(&java::JavaExtractor),
            Self::Unknown => None,
        }
    }

    /// Whether `symbol` follows this language's private-naming convention
    pub fn is_private(self, symbol: &str) -> bool {
        match self {
            Self::Go => symbol.chars().next().is_some_and(|c| !c.is_uppercase()),
            Self::JavaScript => symbol.starts_with('_') || symbol.starts_with('#'),
            _ => symbol.starts_with('_'),
        }
    }
}

/// Structural extraction for one language family
///
/// Fills imports, exports, classes, functions and constants; everything
/// else in the returned record is left at its default.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> FileRecord;
}

/// Local, provider-free analysis of one file
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAnalyzer;

impl LocalAnalyzer {
    pub fn analyze(&self, path: &str, content: &str, language_hint: Option<&str>) -> FileRecord {
        analyze(path, content, language_hint)
    }
}

/// Best-effort record for any input; unrecognized languages yield empty
/// entity lists and purpose `"unknown"` (unless the file name says more)
pub fn analyze(path: &str, content: &str, language_hint: Option<&str>) -> FileRecord {
    let family = LanguageFamily::detect(language_hint, path);
    let mut record = family
        .extractor()
        .map(|extractor| extractor.extract(content))
        .unwrap_or_default();

    record.path = path.to_string();
    record.language = language_hint
        .map(str::to_string)
        .or_else(|| language_name(family).map(str::to_string));

    let mut dependencies: Vec<String> = Vec::new();
    for import in record.imports.iter().filter(|i| i.is_external) {
        if !dependencies.contains(&import.module) {
            dependencies.push(import.module.clone());
        }
    }
    record.dependencies = dependencies;

    let line_count = content.lines().count();
    record.complexity_score = complexity_score(
        record.classes.len(),
        record.functions.len(),
        record.imports.len(),
        line_count,
    );
    record.purpose = infer_purpose(path, record.classes.len(), record.functions.len());
    record.raw_summary = format!(
        "File with {} classes and {} functions",
        record.classes.len(),
        record.functions.len()
    );
    record
}

fn language_name(family: LanguageFamily) -> Option<&'static str> {
    match family {
        LanguageFamily::Python => Some("python"),
        LanguageFamily::JavaScript => Some("javascript"),
        LanguageFamily::Rust => Some("rust"),
        LanguageFamily::Go => Some("go"),
        LanguageFamily::Java => Some("java"),
        LanguageFamily::Unknown => None,
    }
}

/// Baseline 5, nudged by entity counts and file length, clamped to `[1, 10]`
pub fn complexity_score(
    classes: usize,
    functions: usize,
    imports: usize,
    lines: usize,
) -> ComplexityScore {
    let mut score = ComplexityScore::BASELINE as i64;
    if classes > 5 {
        score += 1;
    }
    if functions > 10 {
        score += 1;
    }
    if imports > 15 {
        score += 1;
    }
    if lines > 500 {
        score += 1;
    }
    if lines < 50 {
        score -= 1;
    }
    ComplexityScore::new(score)
}

/// Purpose from the file name first, then from what the file defines
pub fn infer_purpose(path: &str, classes: usize, functions: usize) -> String {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    let purpose = if has(&["test"]) {
        "Test file"
    } else if has(&["config", "settings"]) {
        "Configuration"
    } else if has(&["model"]) {
        "Data models"
    } else if has(&["util", "helper"]) {
        "Utility functions"
    } else if has(&["main", "app", "index"]) {
        "Application entry point"
    } else if has(&["api", "route"]) {
        "API endpoints"
    } else if classes > 0 {
        return format!("defines {} class(es)", classes);
    } else if functions > 0 {
        return format!("defines {} function(s)", functions);
    } else {
        UNKNOWN_PURPOSE
    };
    purpose.to_string()
}

pub const UNKNOWN_PURPOSE: &str = "unknown";

pub(crate) fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Compile-once regex storage for the extractors
pub(crate) fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

/// Byte offset to 1-based line number
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { starts }
    }

    pub(crate) fn line(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

/// Split a parameter or type list on top-level commas
pub(crate) fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in list.chars() {
        match ch {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth -= 1,
            ',' if depth <= 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

/// Index just past the `}` matching the `{` at `open`, or end of text
///
/// Counts braces naively; braces inside strings or comments can skew it.
pub(crate) fn block_end(text: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (idx, byte) in text.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

/// Open-brace nesting level at the end of `text`
pub(crate) fn brace_depth(text: &str) -> usize {
    text.bytes().fold(0usize, |depth, byte| match byte {
        b'{' => depth + 1,
        b'}' => depth.saturating_sub(1),
        _ => depth,
    })
}

/// Strip generic arguments: `Base<T>` becomes `Base`
pub(crate) fn strip_generics(name: &str) -> String {
    name.split('<').next().unwrap_or(name).trim().to_string()
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_formula() {
        assert_eq!(complexity_score(0, 0, 0, 100).get(), 5);
        assert_eq!(complexity_score(0, 0, 0, 10).get(), 4);
        assert_eq!(complexity_score(6, 11, 16, 600).get(), 9);
        assert_eq!(complexity_score(6, 11, 16, 10).get(), 7);
    }

    #[test]
    fn test_purpose_prefers_file_name() {
        assert_eq!(infer_purpose("tests/test_api.py", 3, 0), "Test file");
        assert_eq!(infer_purpose("app/settings.py", 0, 0), "Configuration");
        assert_eq!(infer_purpose("src/user_model.ts", 0, 2), "Data models");
        assert_eq!(infer_purpose("lib/helpers.js", 0, 0), "Utility functions");
        assert_eq!(infer_purpose("src/index.ts", 0, 0), "Application entry point");
        assert_eq!(infer_purpose("server/routes.go", 0, 0), "API endpoints");
        assert_eq!(infer_purpose("core/engine.py", 2, 5), "defines 2 class(es)");
        assert_eq!(infer_purpose("core/engine.py", 0, 5), "defines 5 function(s)");
        assert_eq!(infer_purpose("core/engine.py", 0, 0), "unknown");
    }

    #[test]
    fn test_analyze_never_fails_on_odd_input() {
        for (path, content) in [
            ("empty.py", ""),
            ("weird.xyz", "\u{0}\u{1}{{{{"),
            ("unbalanced.rs", "pub struct A {"),
            ("bad.js", "class extends {"),
            ("noext", "é€\n\n\n"),
        ] {
            let record = analyze(path, content, None);
            let score = record.complexity_score.get();
            assert!((1..=10).contains(&score), "{} scored {}", path, score);
            assert_eq!(record.path, path);
        }
    }

    #[test]
    fn test_unknown_language_has_empty_entities() {
        let record = analyze("notes/readme.xyz", "class Foo: pass\ndef bar(): pass", None);
        assert!(record.classes.is_empty());
        assert!(record.functions.is_empty());
        assert!(record.imports.is_empty());
        assert_eq!(record.purpose, "unknown");
        assert_eq!(record.language, None);
    }

    #[test]
    fn test_hint_overrides_extension() {
        let record = analyze("script", "def main():\n    pass\n", Some("python"));
        assert_eq!(record.functions.len(), 1);
        assert_eq!(record.language.as_deref(), Some("python"));
    }

    #[test]
    fn test_dependencies_are_external_modules() {
        let record = analyze(
            "svc/handler.py",
            "import os\nimport os\nfrom .models import User\nfrom requests import get\n",
            None,
        );
        assert_eq!(record.dependencies, vec!["os", "requests"]);
    }

    #[test]
    fn test_private_conventions() {
        assert!(LanguageFamily::Python.is_private("_helper"));
        assert!(!LanguageFamily::Python.is_private("helper"));
        assert!(LanguageFamily::Go.is_private("helper"));
        assert!(!LanguageFamily::Go.is_private("Helper"));
        assert!(LanguageFamily::JavaScript.is_private("#secret"));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            split_top_level("a: Vec<u8, A>, b: (i32, i32), c"),
            vec!["a: Vec<u8, A>", "b: (i32, i32)", "c"]
        );
        let text = "fn a() { if x { y } }\nrest";
        assert_eq!(&text[..block_end(text, 7)], "fn a() { if x { y } }");

        let index = LineIndex::new("one\ntwo\nthree");
        assert_eq!(index.line(0), 1);
        assert_eq!(index.line(4), 2);
        assert_eq!(index.line(9), 3);
        assert_eq!(extension("src/.env"), None);
        assert_eq!(extension("src/App.TSX").as_deref(), Some("tsx"));
    }
}
