//! Phase 4: code examples
//!
//! Four templated examples for the primary language, plus whatever titled
//! code blocks a capability call returns.

use super::documents::{
    CodeExample, DiscoveryDocument, ExamplesDocument, FileAnalysisSet, ModuleAnalysisDocument,
};
use super::prompts;
use super::PhaseContext;
use crate::analysis::cached;
use crate::coordinator::{ConcurrencyClass, WorkItem};
use crate::types::{FileRecord, ModuleRecord};
use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

const MAX_PARSED_EXAMPLES: usize = 3;
const MIN_CODE_CHARS: usize = 20;
const MAX_TITLE_CHARS: usize = 50;

static TITLED_BLOCK: OnceLock<Regex> = OnceLock::new();

pub(crate) async fn generate_examples(
    ctx: &PhaseContext,
    discovery: &DiscoveryDocument,
    files: &FileAnalysisSet,
    modules: &ModuleAnalysisDocument,
) -> Result<ExamplesDocument> {
    let language = discovery.primary_language();
    let mut examples = vec![
        quick_start(language, &modules.entry_points, &modules.modules),
        api_usage(language, &files.records),
        error_handling(language),
        configuration(language),
    ];

    if let Some(coordinator) = &ctx.coordinator {
        let (apis, classes, functions) = context_lists(modules, &files.records);
        let item = WorkItem::new(
            "examples",
            prompts::examples(language, &apis, &classes, &functions),
        )
        .with_class(ConcurrencyClass::Examples);
        let output = coordinator
            .run_single(item)
            .await
            .into_result()
            .map_err(|e| anyhow!("Example generation failed: {}", e))?;
        let parsed = parse_examples(&output.to_text(), language);
        info!(parsed = parsed.len(), "Parsed capability examples");
        examples.extend(parsed);
    }

    Ok(ExamplesDocument { examples })
}

/// Public APIs, classes with methods, exported functions
fn context_lists(
    modules: &ModuleAnalysisDocument,
    records: &[FileRecord],
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let apis: Vec<String> = modules
        .modules
        .iter()
        .take(5)
        .flat_map(|m| m.public_api.iter().take(5).cloned())
        .take(10)
        .collect();

    let mut classes = Vec::new();
    let mut functions = Vec::new();
    for record in records.iter().take(10) {
        for class in record.classes.iter().take(2) {
            let methods: Vec<&str> = class.methods.iter().take(5).map(|m| m.name.as_str()).collect();
            classes.push(format!("{} ({}): {}", class.name, record.path, methods.join(", ")));
        }
        for function in record.functions.iter().take(3) {
            if record.exports.contains(&function.name) {
                functions.push(format!(
                    "{}({}) in {}",
                    function.name,
                    function.parameters.join(", "),
                    record.path
                ));
            }
        }
    }
    classes.truncate(5);
    functions.truncate(5);
    (apis, classes, functions)
}

/// `### Title`, an optional description line, then a fenced block
pub(crate) fn parse_examples(text: &str, language: &str) -> Vec<CodeExample> {
    let pattern = cached(
        &TITLED_BLOCK,
        r"(?ms)^#{2,4}\s*(?:\d+\.\s*)?([^\n]+?)\s*\n+(?:([^`\n][^\n]*)\n+)?```([\w+#-]*)\n(.*?)```",
    );
    pattern
        .captures_iter(text)
        .filter_map(|cap| {
            let code = cap.get(4)?.as_str().trim();
            if code.chars().count() <= MIN_CODE_CHARS {
                return None;
            }
            let title = cap[1].trim().trim_matches('*').trim();
            let title = if title.chars().count() < MAX_TITLE_CHARS {
                title.to_string()
            } else {
                let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
                format!("{}...", head)
            };
            let fence = cap.get(3).map_or("", |m| m.as_str());
            Some(CodeExample {
                title,
                description: cap.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                code: code.to_string(),
                language: if fence.is_empty() { language } else { fence }.to_string(),
                file_references: Vec::new(),
                prerequisites: Vec::new(),
            })
        })
        .take(MAX_PARSED_EXAMPLES)
        .collect()
}

fn is_script(language: &str) -> bool {
    matches!(language, "javascript" | "typescript")
}

/// `pkg/mod.py` as a Python import path
fn python_module(path: &str) -> String {
    path.strip_suffix(".py").unwrap_or(path).replace('/', ".")
}

fn quick_start(language: &str, entry_points: &[String], modules: &[ModuleRecord]) -> CodeExample {
    let code = match language {
        "python" => {
            let main = modules
                .iter()
                .find(|m| m.name.contains("main") || m.name == "root");
            let imports: Vec<String> = main
                .map(|m| {
                    m.public_api
                        .iter()
                        .take(3)
                        .filter_map(|api| api.rsplit_once(':'))
                        .map(|(file, symbol)| format!("from {} import {}", python_module(file), symbol))
                        .collect()
                })
                .unwrap_or_default();
            let imports = if imports.is_empty() {
                "# Import the main module".to_string()
            } else {
                imports.join("\n")
            };
            format!(
                r#"#!/usr/bin/env python3
"""Quick start example."""

{imports}


def main():
    """Main entry point."""
    print("Quick start example - customize based on your needs")


if __name__ == "__main__":
    main()
"#
            )
        }
        lang if is_script(lang) => r#"// Quick start example
import { MainClass } from './src/main';

async function main() {
    const instance = new MainClass();
    const result = await instance.process('example input');
    console.log(result);
}

main().catch(console.error);
"#
        .to_string(),
        "rust" => r#"// Quick start example
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let app = App::new(config);
    app.run()?;
    Ok(())
}
"#
        .to_string(),
        "go" => r#"// Quick start example
package main

import (
	"fmt"
	"log"
)

func main() {
	app, err := New()
	if err != nil {
		log.Fatal(err)
	}
	fmt.Println(app.Run())
}
"#
        .to_string(),
        other => format!("// Quick start example for {other}\n// Start from the entry points listed below.\n"),
    };

    CodeExample {
        title: "Quick Start".to_string(),
        description: "Minimal example to get started with the library".to_string(),
        code,
        language: language.to_string(),
        file_references: entry_points.iter().take(2).cloned().collect(),
        prerequisites: vec![
            "Install dependencies".to_string(),
            "Configure environment".to_string(),
        ],
    }
}

fn api_usage(language: &str, records: &[FileRecord]) -> CodeExample {
    let mut api_files: Vec<&FileRecord> = records
        .iter()
        .filter(|r| !r.exports.is_empty() && !r.classes.is_empty())
        .collect();
    if api_files.is_empty() {
        api_files = records
            .iter()
            .filter(|r| !r.exports.is_empty() && !r.functions.is_empty())
            .collect();
    }

    let code = match (language, api_files.first()) {
        ("python", Some(file)) => {
            let class = file.classes.first();
            let class_name = class.map_or("MainClass", |c| c.name.as_str());
            let calls: Vec<String> = class
                .map(|c| {
                    c.methods
                        .iter()
                        .take(3)
                        .filter(|m| !m.name.starts_with('_'))
                        .map(|m| {
                            let args: Vec<&str> = m
                                .parameters
                                .iter()
                                .filter(|p| p.as_str() != "self")
                                .take(2)
                                .map(String::as_str)
                                .collect();
                            format!("    result = instance.{}({})", m.name, args.join(", "))
                        })
                        .collect()
                })
                .unwrap_or_default();
            let calls = if calls.is_empty() {
                "    result = instance".to_string()
            } else {
                calls.join("\n")
            };
            format!(
                r#"#!/usr/bin/env python3
"""Example: Using the {class_name} API."""

from {module} import {class_name}


def main():
    instance = {class_name}()
{calls}
    print(f"Result: {{result}}")


if __name__ == "__main__":
    main()
"#,
                module = python_module(&file.path),
            )
        }
        _ => r#"// API Usage Example
// const { MainClass } = require('./src/main');
// const instance = new MainClass();
// const result = instance.someMethod(params);
"#
        .to_string(),
    };

    CodeExample {
        title: "API Usage".to_string(),
        description: "Example demonstrating the main API".to_string(),
        code,
        language: language.to_string(),
        file_references: api_files.iter().take(2).map(|f| f.path.clone()).collect(),
        prerequisites: Vec::new(),
    }
}

fn error_handling(language: &str) -> CodeExample {
    let code = match language {
        "python" => r#"#!/usr/bin/env python3
"""Example: Proper error handling."""


def safe_operation():
    try:
        result = "success"
        return result
    except ValueError as e:
        print(f"Validation error: {e}")
        return None
    except ConnectionError as e:
        print(f"Connection error: {e}")
        return None
    finally:
        pass


def main():
    result = safe_operation()
    if result:
        print(f"Operation succeeded: {result}")
    else:
        print("Operation failed - check logs for details")


if __name__ == "__main__":
    main()
"#,
        "rust" => r#"// Error Handling Example
fn load(path: &std::path::Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text)
}
"#,
        "go" => r#"// Error Handling Example
func load(path string) (string, error) {
	data, err := os.ReadFile(path)
	if err != nil {
		return "", fmt.Errorf("read %s: %w", path, err)
	}
	return string(data), nil
}
"#,
        _ => r#"// Error Handling Example
async function safeOperation() {
    try {
        return await riskyOperation();
    } catch (error) {
        if (error instanceof ValidationError) {
            console.error('Validation failed:', error.message);
            return null;
        }
        throw error;
    }
}
"#,
    };

    CodeExample {
        title: "Error Handling".to_string(),
        description: "Demonstrates proper error handling patterns".to_string(),
        code: code.to_string(),
        language: language.to_string(),
        file_references: Vec::new(),
        prerequisites: Vec::new(),
    }
}

fn configuration(language: &str) -> CodeExample {
    let code = match language {
        "python" => r#"#!/usr/bin/env python3
"""Example: Configuration and customization."""

import os
from dataclasses import dataclass


@dataclass
class Config:
    api_key: str
    base_url: str = "https://api.example.com"
    timeout: int = 30

    @classmethod
    def from_env(cls) -> "Config":
        return cls(
            api_key=os.environ["API_KEY"],
            base_url=os.getenv("BASE_URL", cls.base_url),
            timeout=int(os.getenv("TIMEOUT", cls.timeout)),
        )


if __name__ == "__main__":
    print(Config.from_env())
"#,
        "rust" => r#"// Configuration Example
pub struct Config {
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_key: std::env::var("API_KEY")?,
            timeout_secs: std::env::var("TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}
"#,
        "go" => r#"// Configuration Example
type Config struct {
	APIKey  string
	Timeout time.Duration
}

func ConfigFromEnv() (Config, error) {
	key := os.Getenv("API_KEY")
	if key == "" {
		return Config{}, errors.New("API_KEY environment variable is required")
	}
	return Config{APIKey: key, Timeout: 30 * time.Second}, nil
}
"#,
        _ => r#"// Configuration Example
const config = {
    apiKey: process.env.API_KEY,
    baseUrl: process.env.BASE_URL || 'https://api.example.com',
    timeout: parseInt(process.env.TIMEOUT || '30'),
};

if (!config.apiKey) {
    throw new Error('API_KEY environment variable is required');
}

export default config;
"#,
    };

    CodeExample {
        title: "Configuration".to_string(),
        description: "Shows how to configure the application".to_string(),
        code: code.to_string(),
        language: language.to_string(),
        file_references: Vec::new(),
        prerequisites: vec!["Set environment variables".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassRecord, FunctionRecord};

    #[test]
    fn test_parse_titled_blocks() {
        let text = "Here you go.\n\n\
            ### Integration With Redis\n\
            Caches results in Redis.\n\
            ```python\nimport redis\nclient = redis.Redis()\nclient.set('k', 'v')\n```\n\n\
            ### Tiny\n\
            ```\nx = 1\n```\n\n\
            ## 2. Advanced Usage\n\
            ```\nfor item in pipeline.stream(batch_size=10):\n    handle(item)\n```\n";
        let examples = parse_examples(text, "python");

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].title, "Integration With Redis");
        assert_eq!(examples[0].description, "Caches results in Redis.");
        assert_eq!(examples[0].language, "python");
        assert!(examples[0].code.starts_with("import redis"));
        assert_eq!(examples[1].title, "Advanced Usage");
        assert_eq!(examples[1].description, "");
        assert_eq!(examples[1].language, "python");
    }

    #[test]
    fn test_parse_caps_count_and_title() {
        let long_title = "T".repeat(80);
        let text: String = (0..5)
            .map(|i| format!("### {long_title}{i}\n```rust\nfn example_{i}() {{ run_it(); }}\n```\n\n"))
            .collect();
        let examples = parse_examples(&text, "rust");

        assert_eq!(examples.len(), MAX_PARSED_EXAMPLES);
        assert_eq!(examples[0].title.chars().count(), MAX_TITLE_CHARS);
        assert!(examples[0].title.ends_with("..."));
    }

    #[test]
    fn test_python_api_usage_uses_first_exported_class() {
        let record = FileRecord {
            path: "shop/cart.py".to_string(),
            exports: vec!["Cart".to_string()],
            classes: vec![ClassRecord {
                name: "Cart".to_string(),
                line_number: 1,
                base_classes: Vec::new(),
                methods: vec![
                    FunctionRecord {
                        name: "add".to_string(),
                        line_number: 2,
                        parameters: vec!["self".to_string(), "item".to_string()],
                        return_type: None,
                        description: String::new(),
                    },
                    FunctionRecord {
                        name: "_recalc".to_string(),
                        line_number: 5,
                        parameters: vec!["self".to_string()],
                        return_type: None,
                        description: String::new(),
                    },
                ],
                description: String::new(),
            }],
            ..Default::default()
        };
        let example = api_usage("python", &[record]);

        assert!(example.code.contains("from shop.cart import Cart"));
        assert!(example.code.contains("result = instance.add(item)"));
        assert!(!example.code.contains("_recalc"));
        assert_eq!(example.file_references, vec!["shop/cart.py"]);
    }

    #[test]
    fn test_quick_start_imports_root_api() {
        let module = ModuleRecord {
            name: "root".to_string(),
            path: ".".to_string(),
            files: vec!["app.py".to_string()],
            purpose: String::new(),
            public_api: vec!["app.py:create_app".to_string()],
            internal_components: Vec::new(),
        };
        let example = quick_start("python", &["app.py".to_string()], &[module]);
        assert!(example.code.contains("from app import create_app"));
        assert_eq!(example.file_references, vec!["app.py"]);
    }
}
