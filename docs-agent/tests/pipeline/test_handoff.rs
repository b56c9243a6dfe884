//! Tests for the handoff store with real phase documents

use docs_agent::analysis::LocalAnalyzer;
use docs_agent::pipeline::{
    CodeExample, DiscoveryDocument, ExamplesDocument, FaqDocument, FileAnalysisSet, HandoffStore,
    ModuleAnalysisDocument, ModuleDetailSet, PhaseId,
};
use docs_agent::types::{DirectoryNode, FileClassification, FileType};
use docs_agent::HandoffError;
use std::collections::BTreeMap;

#[tokio::test]
async fn test_documents_survive_a_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = HandoffStore::new(dir.path().join(".handoffs"));
    store.reset().await.unwrap();

    let modules = ModuleAnalysisDocument {
        architecture_patterns: vec!["Layered Architecture".to_string()],
        public_apis: BTreeMap::from([("core".to_string(), vec!["core/a.py:run".to_string()])]),
        key_relationships: vec!["a.py -> b.py (imports)".to_string()],
        ..Default::default()
    };
    let examples = ExamplesDocument {
        examples: vec![CodeExample {
            title: "Quick Start".to_string(),
            description: "Minimal".to_string(),
            code: "print('hi')\nprint(\"quotes: 'and' colons\")\n".to_string(),
            language: "python".to_string(),
            file_references: vec!["main.py".to_string()],
            prerequisites: Vec::new(),
        }],
    };

    let path = store.store(&modules).await.unwrap();
    assert!(path.ends_with("module_analysis.yaml"));
    store.store(&examples).await.unwrap();

    assert_eq!(store.fetch::<ModuleAnalysisDocument>().await.unwrap(), Some(modules));
    assert_eq!(store.fetch::<ExamplesDocument>().await.unwrap(), Some(examples));
    assert_eq!(store.fetch::<FaqDocument>().await.unwrap(), None);
}

#[tokio::test]
async fn test_hand_edited_artifact_with_wrong_shape_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = HandoffStore::new(dir.path());
    std::fs::write(store.path_for(PhaseId::ModuleDetail), "modules: 42\n").unwrap();

    let err = store.fetch::<ModuleDetailSet>().await.unwrap_err();
    assert!(matches!(err, HandoffError::Deserialize { .. }));
}

#[tokio::test]
async fn test_reset_removes_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = HandoffStore::new(dir.path().join(".handoffs"));
    store.reset().await.unwrap();
    store.store(&FaqDocument::default()).await.unwrap();
    assert!(store.contains(PhaseId::Faq));

    store.reset().await.unwrap();

    assert!(!store.contains(PhaseId::Faq));
    assert!(store.dir().is_dir());
}

#[tokio::test]
async fn test_file_analysis_set_round_trips_for_every_language() {
    let dir = tempfile::tempdir().unwrap();
    let store = HandoffStore::new(dir.path().join(".handoffs"));
    store.reset().await.unwrap();

    let sources = [
        (
            "app/service.py",
            "from .models import User\nimport os\n\nclass Service(User):\n    def run(self, job: str) -> bool:\n        return True\n\nMAX_JOBS = 3\n",
        ),
        (
            "web/api.ts",
            "import { get } from './http';\nexport class Client extends Base {\n  fetch(id: string): Promise<void> {}\n}\nexport const TIMEOUT = 30;\n",
        ),
        (
            "src/store.rs",
            "use crate::types::Item;\n\npub struct Store {\n    items: Vec<Item>,\n}\n\npub fn open(path: &str) -> Result<Store, Error> {\n    todo!()\n}\n",
        ),
        (
            "cmd/main.go",
            "package main\n\nimport (\n\t\"fmt\"\n\tlog \"github.com/sirupsen/logrus\"\n)\n\nfunc Run(limit int) (*Server, error) {\n\treturn nil, nil\n}\n",
        ),
        (
            "src/com/acme/Order.java",
            "package com.acme;\n\nimport java.util.List;\n\npublic class Order extends Entity implements Serializable {\n    public List<Item> items() { return null; }\n}\n",
        ),
    ];
    let mut records: Vec<_> = sources
        .iter()
        .map(|(path, source)| LocalAnalyzer.analyze(path, source, None))
        .collect();
    records[0].key_insights = vec!["Quotes: 'single' and \"double\" # not a comment".to_string()];
    let set = FileAnalysisSet {
        records,
        skipped: vec!["assets/huge.json".to_string()],
    };
    assert!(set.records.iter().all(|r| r.language.is_some()));

    store.store(&set).await.unwrap();

    assert_eq!(store.fetch::<FileAnalysisSet>().await.unwrap(), Some(set));
}

#[tokio::test]
async fn test_discovery_document_with_truncated_tree_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = HandoffStore::new(dir.path().join(".handoffs"));
    store.reset().await.unwrap();

    let leaf = |name: &str| DirectoryNode {
        name: name.to_string(),
        is_dir: false,
        ..Default::default()
    };
    let document = DiscoveryDocument {
        repository_path: "/work/shop".to_string(),
        repository_name: "shop".to_string(),
        total_files: 2,
        files: vec![
            FileClassification {
                path: "main.go".to_string(),
                file_type: FileType::SourceCode,
                language: Some("go".to_string()),
                importance: 10,
                size: 120,
            },
            FileClassification {
                path: "docs/notes.md".to_string(),
                file_type: FileType::Documentation,
                language: None,
                importance: 5,
                size: 0,
            },
        ],
        directory_structure: DirectoryNode {
            name: "shop".to_string(),
            is_dir: true,
            children: vec![
                leaf("main.go"),
                DirectoryNode {
                    name: "deep".to_string(),
                    is_dir: true,
                    children: Vec::new(),
                    truncated: true,
                },
            ],
            truncated: false,
        },
        detected_languages: vec!["go".to_string()],
        detected_frameworks: Vec::new(),
        entry_points: vec!["main.go".to_string()],
        go_module: Some("github.com/acme/shop".to_string()),
        summary: "A shop.\n\nServes: orders".to_string(),
    };

    store.store(&document).await.unwrap();

    assert_eq!(store.fetch::<DiscoveryDocument>().await.unwrap(), Some(document));
}
