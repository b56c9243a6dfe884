//! Tests for pattern-based local analysis through the public entry point

use docs_agent::analysis::{LocalAnalyzer, UNKNOWN_PURPOSE};

#[test]
fn test_python_class_and_function() {
    let record = LocalAnalyzer.analyze(
        "svc/worker.py",
        "import os\nfrom .jobs import Job\n\nclass Worker(Job):\n    def start(self):\n        pass\n\ndef run():\n    pass\n",
        None,
    );

    assert_eq!(record.language.as_deref(), Some("python"));
    assert_eq!(record.classes.len(), 1);
    assert_eq!(record.classes[0].base_classes, vec!["Job"]);
    assert_eq!(record.functions.len(), 1);
    assert!(record.functions[0].parameters.is_empty());
    assert_eq!(record.exports, vec!["Worker", "run"]);
    assert_eq!(record.dependencies, vec!["os"]);
    assert_eq!(record.purpose, "defines 1 class(es)");
    // Short file: baseline 5 minus one
    assert_eq!(record.complexity_score.get(), 4);
}

#[test]
fn test_name_based_purpose_wins() {
    let record = LocalAnalyzer.analyze("app/models.py", "class User:\n    pass\n", Some("python"));
    assert_eq!(record.purpose, "Data models");
}

#[test]
fn test_unknown_language_yields_empty_record() {
    let record = LocalAnalyzer.analyze("notes/plan.xyz", "class Foo:\n    pass\n", None);

    assert!(record.language.is_none());
    assert!(record.classes.is_empty());
    assert!(record.functions.is_empty());
    assert!(record.imports.is_empty());
    assert_eq!(record.purpose, UNKNOWN_PURPOSE);
}

#[test]
fn test_garbage_input_does_not_panic() {
    let garbage = "class (((\n def )\n fn <<<>>> {{{{ \u{0}\u{fffd} import \n";
    for path in ["a.py", "a.js", "a.ts", "a.rs", "a.go", "A.java"] {
        let record = LocalAnalyzer.analyze(path, garbage, None);
        assert_eq!(record.path, path);
        let score = record.complexity_score.get();
        assert!((1..=10).contains(&score));
    }
}

#[test]
fn test_language_hint_overrides_extension() {
    let record = LocalAnalyzer.analyze("scripts/build", "def main():\n    pass\n", Some("python"));
    assert_eq!(record.language.as_deref(), Some("python"));
    assert_eq!(record.functions.len(), 1);
}
