//! Runtime configuration for a documentation run

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory names never descended into when walking a repository
pub const DEFAULT_SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "coverage",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "eggs",
    ".eggs",
];

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Per-phase ceilings on in-flight capability calls
///
/// Cheap per-file calls get a wide ceiling; expensive synthesis calls a
/// narrow one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    pub default: usize,
    pub discovery: usize,
    pub file_analysis: usize,
    pub module_analysis: usize,
    pub synthesis: usize,
    pub examples: usize,
    pub faq: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            default: 5,
            discovery: 5,
            file_analysis: 10,
            module_analysis: 5,
            synthesis: 5,
            examples: 2,
            faq: 3,
        }
    }
}

/// Configuration for a documentation run
///
/// # Examples
///
/// ```no_run
/// use docs_agent::DocsConfig;
///
/// let config = DocsConfig {
///     offline: true,
///     skip_examples: true,
///     ..DocsConfig::for_repository("./my-project")
/// };
/// assert!(config.handoff_dir().ends_with(".handoffs"));
/// ```
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Repository to document
    pub repository: PathBuf,
    /// Where rendered markdown and `.handoffs/` land
    pub output_dir: PathBuf,
    pub limits: ConcurrencyLimits,
    /// Upper bound on one capability call
    pub call_timeout: Duration,
    /// Files above this size are skipped during file analysis
    pub max_file_bytes: u64,
    /// Source text sent to the provider is cut at this many characters
    pub prompt_char_limit: usize,
    /// Top-level directories explored during discovery (root included)
    pub max_explored_dirs: usize,
    /// Modules sent for per-module capability analysis
    pub max_capability_modules: usize,
    pub skip_dirs: Vec<String>,
    pub skip_examples: bool,
    /// Never call a provider, run every phase on its local path
    pub offline: bool,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("."),
            output_dir: PathBuf::from("./output"),
            limits: ConcurrencyLimits::default(),
            call_timeout: Duration::from_secs(120),
            max_file_bytes: 500 * 1024,
            prompt_char_limit: 12_000,
            max_explored_dirs: 15,
            max_capability_modules: 12,
            skip_dirs: DEFAULT_SKIP_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_examples: false,
            offline: false,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

impl DocsConfig {
    pub fn for_repository(repository: impl AsRef<Path>) -> Self {
        Self {
            repository: repository.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `.env` and process environment
    ///
    /// Reads `ANTHROPIC_API_KEY`, `DOCS_AGENT_MODEL`, `DOCS_AGENT_ENDPOINT`
    /// and `DOCS_AGENT_OUTPUT_DIR`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(model) = env::var("DOCS_AGENT_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = env::var("DOCS_AGENT_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(dir) = env::var("DOCS_AGENT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn handoff_dir(&self) -> PathBuf {
        self.output_dir.join(".handoffs")
    }

    /// Name of the repository directory, used as the documentation title
    pub fn repository_name(&self) -> String {
        let path = self
            .repository
            .canonicalize()
            .unwrap_or_else(|_| self.repository.clone());
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string())
    }

    /// Directory filter handed to the repository walker
    pub fn should_descend(&self, dir_name: &str) -> bool {
        !dir_name.starts_with('.') && !self.skip_dirs.iter().any(|skip| skip == dir_name)
    }

    /// A provider is used only when online and a key is present
    pub fn wants_provider(&self) -> bool {
        !self.offline && self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_wider_for_cheap_calls() {
        let limits = ConcurrencyLimits::default();
        assert!(limits.file_analysis > limits.synthesis);
        assert!(limits.examples < limits.module_analysis);
    }

    #[test]
    fn test_should_descend_skips_hidden_and_listed() {
        let config = DocsConfig::default();
        assert!(config.should_descend("src"));
        assert!(!config.should_descend("node_modules"));
        assert!(!config.should_descend(".github"));
        assert!(!config.should_descend("__pycache__"));
    }

    #[test]
    fn test_handoff_dir_lives_under_output() {
        let config = DocsConfig {
            output_dir: PathBuf::from("/tmp/docs-out"),
            ..Default::default()
        };
        assert_eq!(config.handoff_dir(), PathBuf::from("/tmp/docs-out/.handoffs"));
    }

    #[test]
    fn test_offline_disables_provider() {
        let config = DocsConfig {
            api_key: Some("sk-test".to_string()),
            offline: true,
            ..Default::default()
        };
        assert!(!config.wants_provider());

        let online = DocsConfig {
            offline: false,
            ..config
        };
        assert!(online.wants_provider());
    }
}
