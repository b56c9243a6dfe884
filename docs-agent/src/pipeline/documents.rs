//! Phase documents
//!
//! Each phase hands exactly one of these to the next phase and to the
//! [`HandoffStore`](super::HandoffStore). Documents are built once and never
//! mutated afterwards; field names are the artifact's on-disk keys.

use super::handoff::PhaseId;
use super::state::Phase;
use crate::types::{
    DependencyEdge, DirectoryNode, FileClassification, FileRecord, ModuleRecord,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A document with its own handoff artifact
pub trait PhaseDocument: Serialize + DeserializeOwned + Send + Sync {
    const ID: PhaseId;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub repository_path: String,
    pub repository_name: String,
    pub total_files: usize,
    pub files: Vec<FileClassification>,
    pub directory_structure: DirectoryNode,
    #[serde(default)]
    pub detected_languages: Vec<String>,
    #[serde(default)]
    pub detected_frameworks: Vec<String>,
    #[serde(default)]
    pub entry_points: Vec<String>,
    /// Module path declared in `go.mod`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_module: Option<String>,
    pub summary: String,
}

impl DiscoveryDocument {
    /// First detected language, used to pick example templates
    pub fn primary_language(&self) -> &str {
        self.detected_languages
            .first()
            .map(String::as_str)
            .unwrap_or("python")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaInsight {
    pub area: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedExploration {
    pub area: String,
    pub error: String,
}

/// Per-directory exploration results gathered during discovery
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplorationReport {
    #[serde(default)]
    pub insights: Vec<AreaInsight>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub failed_explorations: Vec<FailedExploration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileAnalysisSet {
    pub records: Vec<FileRecord>,
    /// Analyzable files that could not be read
    #[serde(default)]
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleAnalysisDocument {
    pub modules: Vec<ModuleRecord>,
    pub dependency_graph: Vec<DependencyEdge>,
    #[serde(default)]
    pub architecture_patterns: Vec<String>,
    #[serde(default)]
    pub data_flow: Vec<String>,
    #[serde(default)]
    pub entry_points: Vec<String>,
    /// Module name to its public API entries
    #[serde(default)]
    pub public_apis: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub key_relationships: Vec<String>,
    #[serde(default)]
    pub architectural_insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDetail {
    pub name: String,
    pub analysis: String,
}

/// Long-form module analysis, kept out of the module document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleDetailSet {
    #[serde(default)]
    pub modules: Vec<ModuleDetail>,
    #[serde(default)]
    pub architecture: Option<String>,
}

impl ModuleDetailSet {
    pub fn analysis_for(&self, module: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|m| m.name == module)
            .map(|m| m.analysis.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocSection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<DocSection>,
}

impl DocSection {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            subsections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    pub title: String,
    pub description: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub file_references: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExamplesDocument {
    pub examples: Vec<CodeExample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaqDocument {
    pub entries: Vec<FaqEntry>,
}

/// The assembled documentation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinalDocument {
    pub repository_name: String,
    /// Markdown for the README
    pub overview: String,
    pub architecture: DocSection,
    pub modules: Vec<DocSection>,
    pub api_reference: DocSection,
    pub getting_started: DocSection,
    #[serde(default)]
    pub examples: Vec<CodeExample>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    /// Phases whose contribution was replaced by an empty result
    #[serde(default)]
    pub degraded_phases: Vec<Phase>,
}

impl PhaseDocument for DiscoveryDocument {
    const ID: PhaseId = PhaseId::Discovery;
}

impl PhaseDocument for ExplorationReport {
    const ID: PhaseId = PhaseId::Exploration;
}

impl PhaseDocument for FileAnalysisSet {
    const ID: PhaseId = PhaseId::FileAnalysis;
}

impl PhaseDocument for ModuleAnalysisDocument {
    const ID: PhaseId = PhaseId::ModuleAnalysis;
}

impl PhaseDocument for ModuleDetailSet {
    const ID: PhaseId = PhaseId::ModuleDetail;
}

impl PhaseDocument for ExamplesDocument {
    const ID: PhaseId = PhaseId::Examples;
}

impl PhaseDocument for FaqDocument {
    const ID: PhaseId = PhaseId::Faq;
}

// Synthesis output and the finished document share a shape; the store keeps
// both, the synthesis artifact with empty examples and FAQ.
impl PhaseDocument for FinalDocument {
    const ID: PhaseId = PhaseId::Final;
}
