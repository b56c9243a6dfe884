//! Data records shared by the analyzer, the graph builder and the pipeline
//!
//! Every record derives `Serialize`/`Deserialize` with stable snake_case
//! field names so that a handoff artifact written by one run can be read back
//! into the same shape by a later one.

use serde::{Deserialize, Serialize};

/// Complexity score, always within `[1, 10]`
///
/// Out-of-range values (from a capability response or a hand-edited artifact)
/// are clamped on construction and on deserialization instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct ComplexityScore(u8);

impl ComplexityScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const BASELINE: u8 = 5;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ComplexityScore {
    fn default() -> Self {
        Self(Self::BASELINE)
    }
}

impl From<i64> for ComplexityScore {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<ComplexityScore> for u8 {
    fn from(score: ComplexityScore) -> Self {
        score.0
    }
}

/// One import/include/use statement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportRef {
    pub module: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub is_relative: bool,
    #[serde(default)]
    pub is_external: bool,
}

impl ImportRef {
    /// Relative or project-internal, i.e. a candidate for edge resolution
    pub fn is_local(&self) -> bool {
        self.is_relative || !self.is_external
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub line_number: usize,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub line_number: usize,
    #[serde(default)]
    pub base_classes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<FunctionRecord>,
    #[serde(default)]
    pub description: String,
}

/// Structured facts about one source file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository-relative path with `/` separators; unique within a run
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub imports: Vec<ImportRef>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
    #[serde(default)]
    pub constants: Vec<String>,
    #[serde(default)]
    pub key_insights: Vec<String>,
    /// External packages this file imports
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub complexity_score: ComplexityScore,
    #[serde(default)]
    pub raw_summary: String,
}

impl FileRecord {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Containing directory, `"."` for files at the repository root
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) if idx > 0 => &self.path[..idx],
            _ => ".",
        }
    }
}

/// A group of files sharing a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub path: String,
    pub files: Vec<String>,
    pub purpose: String,
    #[serde(default)]
    pub public_api: Vec<String>,
    #[serde(default)]
    pub internal_components: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Imports,
    Extends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStrength {
    Weak,
    Normal,
    Strong,
}

/// Directed relationship between two analyzed files
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub relationship: EdgeKind,
    pub strength: EdgeStrength,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Imports => write!(f, "imports"),
            EdgeKind::Extends => write!(f, "extends"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    SourceCode,
    Config,
    Documentation,
    Test,
    Build,
    Data,
    Other,
}

/// Discovery-time classification of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileClassification {
    pub path: String,
    pub file_type: FileType,
    #[serde(default)]
    pub language: Option<String>,
    /// 1 (noise) to 10 (entry point)
    pub importance: u8,
    #[serde(default)]
    pub size: u64,
}

/// Depth-limited directory tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
    /// Set when the depth limit cut this directory's listing
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}
