//! Tests for module identification and dependency edges

use docs_agent::analysis::{go, LocalAnalyzer};
use docs_agent::graph::{key_relationships, DependencyGraphBuilder, ModuleIdentifier};
use docs_agent::types::{EdgeKind, FileRecord};

fn python(path: &str, source: &str) -> FileRecord {
    LocalAnalyzer.analyze(path, source, Some("python"))
}

// ============================================================================
// Module Identification Tests
// ============================================================================

#[test]
fn test_two_root_files_are_not_a_module() {
    let records = vec![
        python("setup.py", "def setup():\n    pass\n"),
        python("manage.py", "def main():\n    pass\n"),
        python("core/engine.py", "class Engine:\n    pass\n"),
    ];
    let modules = ModuleIdentifier.identify(&records);

    let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["core"]);
}

#[test]
fn test_three_root_files_form_root_module() {
    let records = vec![
        python("setup.py", "def setup():\n    pass\n"),
        python("manage.py", "def main():\n    pass\n"),
        python("tasks.py", "def build():\n    pass\n"),
    ];
    let modules = ModuleIdentifier.identify(&records);

    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "root");
    assert_eq!(modules[0].files, vec!["setup.py", "manage.py", "tasks.py"]);
    assert!(modules[0].public_api.contains(&"manage.py:main".to_string()));
}

#[test]
fn test_nested_directories_use_dotted_names() {
    let records = vec![python("api/v1/routes.py", "def index():\n    pass\n")];
    let modules = ModuleIdentifier.identify(&records);
    assert_eq!(modules[0].name, "api.v1");
    assert_eq!(modules[0].path, "api/v1");
}

// ============================================================================
// Dependency Edge Tests
// ============================================================================

#[test]
fn test_relative_import_and_inheritance_edges() {
    let records = vec![
        python("app/base.py", "class Base:\n    pass\n"),
        python(
            "app/service.py",
            "from .base import Base\nimport requests\n\nclass Service(Base):\n    pass\n",
        ),
    ];
    let edges = DependencyGraphBuilder.build(&records);

    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.source == "app/service.py" && e.target == "app/base.py"));
    assert_eq!(edges[0].relationship, EdgeKind::Imports);
    assert_eq!(edges[1].relationship, EdgeKind::Extends);
    assert_eq!(
        key_relationships(&edges, 1),
        vec!["app/service.py -> app/base.py (imports)"]
    );
}

#[test]
fn test_edges_only_target_analyzed_files() {
    let records = vec![python(
        "app/service.py",
        "from .missing import Thing\n\nclass Service(Unknown):\n    pass\n",
    )];
    let edges = DependencyGraphBuilder.build(&records);
    assert!(edges.is_empty());
}

#[test]
fn test_third_party_go_imports_are_dependencies_not_edges() {
    let main = LocalAnalyzer.analyze(
        "cmd/main.go",
        "package main\n\nimport (\n\t\"github.com/sirupsen/logrus\"\n\t\"github.com/spf13/cobra/doc\"\n)\n",
        None,
    );
    let client = LocalAnalyzer.analyze(
        "internal/docker/client.go",
        "package docker\n\ntype Client struct{}\n",
        None,
    );

    assert_eq!(
        main.dependencies,
        vec!["github.com/sirupsen/logrus", "github.com/spf13/cobra/doc"]
    );
    assert!(DependencyGraphBuilder.build(&[main, client]).is_empty());
}

#[test]
fn test_go_module_imports_resolve_to_local_packages() {
    let mut main = LocalAnalyzer.analyze(
        "cmd/main.go",
        "package main\n\nimport (\n\t\"github.com/acme/shop/internal/docker\"\n\t\"github.com/spf13/cobra\"\n)\n",
        None,
    );
    let client = LocalAnalyzer.analyze(
        "internal/docker/client.go",
        "package docker\n\ntype Client struct{}\n",
        None,
    );
    go::classify_module_imports(&mut main, "github.com/acme/shop");

    assert_eq!(main.dependencies, vec!["github.com/spf13/cobra"]);
    let edges = DependencyGraphBuilder.build(&[main, client]);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "cmd/main.go");
    assert_eq!(edges[0].target, "internal/docker/client.go");
    assert_eq!(edges[0].relationship, EdgeKind::Imports);
}
