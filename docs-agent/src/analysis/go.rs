//! Go extraction

use super::{block_end, cached, push_unique, split_top_level, Extractor, LineIndex};
use crate::types::{ClassRecord, FileRecord, FunctionRecord, ImportRef};
use regex::Regex;
use std::sync::OnceLock;

static IMPORT_SINGLE: OnceLock<Regex> = OnceLock::new();
static IMPORT_BLOCK: OnceLock<Regex> = OnceLock::new();
static IMPORT_SPEC: OnceLock<Regex> = OnceLock::new();
static TYPE: OnceLock<Regex> = OnceLock::new();
static EMBEDDED: OnceLock<Regex> = OnceLock::new();
static FUNCTION: OnceLock<Regex> = OnceLock::new();
static RECEIVER: OnceLock<Regex> = OnceLock::new();
static CONST_SINGLE: OnceLock<Regex> = OnceLock::new();
static CONST_BLOCK: OnceLock<Regex> = OnceLock::new();
static CONST_SPEC: OnceLock<Regex> = OnceLock::new();

pub struct GoExtractor;

impl Extractor for GoExtractor {
    fn extract(&self, text: &str) -> FileRecord {
        let lines = LineIndex::new(text);
        let mut record = FileRecord {
            imports: imports(text),
            ..Default::default()
        };

        let type_re = cached(
            &TYPE,
            r"(?m)^type\s+(\w+)(?:\[[^\]]*\])?\s+(struct|interface)\s*\{",
        );
        for cap in type_re.captures_iter(text) {
            let (Some(whole), Some(name), Some(kind)) = (cap.get(0), cap.get(1), cap.get(2)) else {
                continue;
            };
            let open = whole.end() - 1;
            let body = &text[open..block_end(text, open)];
            record.classes.push(ClassRecord {
                name: name.as_str().to_string(),
                line_number: lines.line(whole.start()),
                base_classes: embedded_types(body),
                methods: Vec::new(),
                description: kind.as_str().to_string(),
            });
            if is_exported(name.as_str()) {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        let receiver_re = cached(
            &RECEIVER,
            r"(?m)^func\s*\(\s*(?:\w+\s+)?\*?(\w+)(?:\[[^\]]*\])?\s*\)\s*(\w+)\s*\(([^)]*)\)\s*([^{\n]*?)\s*\{",
        );
        for cap in receiver_re.captures_iter(text) {
            let (Some(whole), Some(receiver), Some(name)) = (cap.get(0), cap.get(1), cap.get(2)) else {
                continue;
            };
            let method = function_record(
                name.as_str(),
                lines.line(whole.start()),
                cap.get(3).map_or("", |m| m.as_str()),
                cap.get(4).map_or("", |m| m.as_str()),
            );
            if let Some(class) = record
                .classes
                .iter_mut()
                .find(|c| c.name == receiver.as_str())
            {
                class.methods.push(method);
            }
        }

        let function_re = cached(
            &FUNCTION,
            r"(?m)^func\s+(\w+)(?:\[[^\]]*\])?\s*\(([^)]*)\)\s*([^{\n]*?)\s*\{",
        );
        for cap in function_re.captures_iter(text) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            record.functions.push(function_record(
                name.as_str(),
                lines.line(whole.start()),
                cap.get(2).map_or("", |m| m.as_str()),
                cap.get(3).map_or("", |m| m.as_str()),
            ));
            if is_exported(name.as_str()) {
                push_unique(&mut record.exports, name.as_str());
            }
        }

        for name in constants(text) {
            if is_exported(&name) {
                push_unique(&mut record.exports, name.as_str());
            }
            push_unique(&mut record.constants, name);
        }

        record
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn function_record(name: &str, line_number: usize, params: &str, returns: &str) -> FunctionRecord {
    let returns = returns.trim();
    FunctionRecord {
        name: name.to_string(),
        line_number,
        parameters: parameters(params),
        return_type: (!returns.is_empty()).then(|| returns.to_string()),
        description: String::new(),
    }
}

/// `a, b int, c string` names `a`, `b` and `c`
fn parameters(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .filter_map(|p| p.split_whitespace().next().map(str::to_string))
        .collect()
}

/// Embedded fields: a lone (possibly qualified, possibly pointer) type name on a line
fn embedded_types(body: &str) -> Vec<String> {
    let embedded_re = cached(&EMBEDDED, r"(?m)^[ \t]+\*?(?:\w+\.)?([A-Z]\w*)[ \t]*(?://.*)?$");
    let mut bases = Vec::new();
    for cap in embedded_re.captures_iter(body) {
        if let Some(name) = cap.get(1) {
            push_unique(&mut bases, name.as_str());
        }
    }
    bases
}

/// Import paths
///
/// Relative paths (`./x`) are local. Every other path is external until
/// [`classify_module_imports`] claims the ones under the repository's own
/// module.
fn import_ref(alias: Option<&str>, path: &str) -> ImportRef {
    let is_relative = path.starts_with("./") || path.starts_with("../");
    let package = path.rsplit('/').next().unwrap_or(path);
    let name = match alias {
        Some("_") | Some(".") | None => package,
        Some(alias) => alias,
    };
    ImportRef {
        module: path.to_string(),
        names: vec![name.to_string()],
        is_relative,
        is_external: !is_relative,
    }
}

/// Module path declared by a `go.mod` file
pub fn module_path(go_mod: &str) -> Option<String> {
    go_mod
        .lines()
        .map(str::trim)
        .find_map(|line| {
            line.strip_prefix("module")
                .filter(|rest| rest.starts_with(char::is_whitespace))
        })
        .and_then(|rest| rest.split("//").next())
        .map(|path| path.trim().trim_matches('"').to_string())
        .filter(|path| !path.is_empty())
}

/// Mark imports under `module` as internal and rewrite them relative to the
/// repository root (`github.com/acme/shop/internal/db` becomes
/// `internal/db`); the dependency list keeps only what is still external.
pub fn classify_module_imports(record: &mut FileRecord, module: &str) {
    let module = module.trim_end_matches('/');
    for import in record.imports.iter_mut().filter(|i| !i.is_relative) {
        if import.module == module {
            import.is_external = false;
        } else if let Some(rest) = import
            .module
            .strip_prefix(module)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            import.module = rest.to_string();
            import.is_external = false;
        }
    }
    let imports = &record.imports;
    record
        .dependencies
        .retain(|dep| imports.iter().any(|i| i.is_external && &i.module == dep));
}

fn imports(text: &str) -> Vec<ImportRef> {
    let mut found: Vec<(usize, ImportRef)> = Vec::new();

    let single_re = cached(&IMPORT_SINGLE, r#"(?m)^import\s+(\w+|\.|_)?\s*"([^"]+)""#);
    for cap in single_re.captures_iter(text) {
        let (Some(whole), Some(path)) = (cap.get(0), cap.get(2)) else {
            continue;
        };
        let alias = cap.get(1).map(|m| m.as_str());
        found.push((whole.start(), import_ref(alias, path.as_str())));
    }

    let block_re = cached(&IMPORT_BLOCK, r"(?ms)^import\s*\((.*?)^\)");
    let spec_re = cached(&IMPORT_SPEC, r#"(?m)^[ \t]*(\w+|\.|_)?[ \t]*"([^"]+)""#);
    for block in block_re.captures_iter(text) {
        let Some(specs) = block.get(1) else { continue };
        for cap in spec_re.captures_iter(specs.as_str()) {
            let (Some(whole), Some(path)) = (cap.get(0), cap.get(2)) else {
                continue;
            };
            let alias = cap.get(1).map(|m| m.as_str());
            found.push((specs.start() + whole.start(), import_ref(alias, path.as_str())));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, import)| import).collect()
}

fn constants(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let single_re = cached(&CONST_SINGLE, r"(?m)^const\s+(\w+)");
    for cap in single_re.captures_iter(text) {
        if let Some(name) = cap.get(1) {
            names.push((name.start(), name.as_str().to_string()));
        }
    }
    let block_re = cached(&CONST_BLOCK, r"(?ms)^const\s*\((.*?)^\)");
    let spec_re = cached(&CONST_SPEC, r"(?m)^[ \t]+(\w+)");
    for block in block_re.captures_iter(text) {
        let Some(specs) = block.get(1) else { continue };
        for cap in spec_re.captures_iter(specs.as_str()) {
            if let Some(name) = cap.get(1) {
                names.push((specs.start() + name.start(), name.as_str().to_string()));
            }
        }
    }
    names.sort_by_key(|(offset, _)| *offset);
    names.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"package store

import "fmt"

import (
	"context"
	"net/http"
	log "github.com/sirupsen/logrus"
	"github.com/acme/shop/internal/model"
	_ "./migrations"
)

const Version = "1.0"

const (
	DefaultLimit = 20
	maxRetries   = 3
)

type Store interface {
	Reader
	Get(ctx context.Context, id string) (*model.Item, error)
}

type MemoryStore struct {
	sync.Mutex
	*BaseStore
	items map[string]*model.Item
}

func (s *MemoryStore) Get(ctx context.Context, id string) (*model.Item, error) {
	return nil, nil
}

func (s MemoryStore) len() int {
	return 0
}

func NewMemoryStore(limit, capacity int) *MemoryStore {
	return &MemoryStore{}
}

func helper() {
}
"#;

    #[test]
    fn test_imports() {
        let record = GoExtractor.extract(SAMPLE);
        let modules: Vec<_> = record.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(
            modules,
            vec![
                "fmt",
                "context",
                "net/http",
                "github.com/sirupsen/logrus",
                "github.com/acme/shop/internal/model",
                "./migrations"
            ]
        );
        assert!(record.imports[0].is_external);
        assert!(record.imports[2].is_external);
        assert_eq!(record.imports[3].names, vec!["log"]);
        assert!(record.imports[3].is_external);
        assert!(record.imports[4].is_external);
        assert_eq!(record.imports[4].names, vec!["model"]);
        assert!(record.imports[5].is_relative);
        assert!(!record.imports[5].is_external);
    }

    #[test]
    fn test_module_path_from_go_mod() {
        let go_mod = "// shop service\nmodule github.com/acme/shop\n\ngo 1.22\n\nrequire (\n\tgithub.com/sirupsen/logrus v1.9.3\n)\n";
        assert_eq!(module_path(go_mod).as_deref(), Some("github.com/acme/shop"));
        assert_eq!(module_path("go 1.22\n"), None);
        assert_eq!(module_path("modules are not declared here\n"), None);
        assert_eq!(
            module_path("module example.com/tool // indirect\n").as_deref(),
            Some("example.com/tool")
        );
    }

    #[test]
    fn test_module_imports_become_internal() {
        let mut record = GoExtractor.extract(SAMPLE);
        record.dependencies = record
            .imports
            .iter()
            .filter(|i| i.is_external)
            .map(|i| i.module.clone())
            .collect();

        classify_module_imports(&mut record, "github.com/acme/shop");

        let model = &record.imports[4];
        assert_eq!(model.module, "internal/model");
        assert!(!model.is_external);
        assert!(record.imports[3].is_external);
        assert_eq!(
            record.dependencies,
            vec!["fmt", "context", "net/http", "github.com/sirupsen/logrus"]
        );
    }

    #[test]
    fn test_module_prefix_must_end_at_a_segment() {
        let mut record = GoExtractor.extract("import \"github.com/acme/shopping/cart\"\n");
        classify_module_imports(&mut record, "github.com/acme/shop");
        assert!(record.imports[0].is_external);
        assert_eq!(record.imports[0].module, "github.com/acme/shopping/cart");
    }

    #[test]
    fn test_types_and_receivers() {
        let record = GoExtractor.extract(SAMPLE);
        assert_eq!(record.classes.len(), 2);

        let store = &record.classes[0];
        assert_eq!(store.name, "Store");
        assert_eq!(store.description, "interface");
        assert_eq!(store.base_classes, vec!["Reader"]);

        let memory = &record.classes[1];
        assert_eq!(memory.base_classes, vec!["Mutex", "BaseStore"]);
        let methods: Vec<_> = memory.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["Get", "len"]);
        assert_eq!(memory.methods[0].parameters, vec!["ctx", "id"]);
        assert_eq!(memory.methods[0].return_type.as_deref(), Some("(*model.Item, error)"));
    }

    #[test]
    fn test_functions_exports_constants() {
        let record = GoExtractor.extract(SAMPLE);
        let names: Vec<_> = record.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["NewMemoryStore", "helper"]);
        assert_eq!(record.functions[0].parameters, vec!["limit", "capacity"]);
        assert_eq!(record.functions[1].return_type, None);

        assert_eq!(record.constants, vec!["Version", "DefaultLimit", "maxRetries"]);
        assert_eq!(
            record.exports,
            vec!["Store", "MemoryStore", "NewMemoryStore", "Version", "DefaultLimit"]
        );
    }
}
