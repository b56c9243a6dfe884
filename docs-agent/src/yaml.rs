//! YAML helpers for capability output and handoff artifacts

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Pull the YAML (or JSON) body out of a capability response
///
/// Handles:
/// - a ```yaml / ```yml / ```json fenced block
/// - a generic ``` block
/// - raw text, with a leading `---` separator removed
pub fn extract_yaml(text: &str) -> String {
    let body = ["```yaml", "```yml", "```json"]
        .iter()
        .find_map(|fence| fenced_body(text, fence))
        .or_else(|| fenced_body(text, "```"))
        .unwrap_or_else(|| text.trim());

    clean_yaml(body)
}

fn fenced_body<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    let end = rest.rfind("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Remove document separators and surrounding whitespace
pub fn clean_yaml(yaml: &str) -> String {
    yaml.trim_start_matches("---").trim().to_string()
}

/// Parse YAML into a typed structure, logging a preview when it fails
pub fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_str(yaml).map_err(|e| {
        let preview: String = yaml.chars().take(300).collect();
        if e.to_string().contains("duplicate") {
            warn!(error = %e, %preview, "YAML contains duplicate keys");
        } else {
            warn!(error = %e, %preview, "YAML syntax error");
        }
        e
    })
}

/// Parse a capability response into a generic structured value
///
/// Only mappings and sequences count as structured; a bare scalar means the
/// response was prose.
pub fn parse_structured(text: &str) -> Result<serde_json::Value> {
    let yaml = extract_yaml(text);
    let value: serde_json::Value =
        serde_yaml::from_str(&yaml).context("Response is not valid YAML or JSON")?;

    match value {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => Ok(value),
        other => anyhow::bail!("Expected a mapping or list, got {}", kind_name(&other)),
    }
}

fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}
