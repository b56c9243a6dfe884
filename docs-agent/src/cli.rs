//! CLI argument parsing for the documentation pipeline

use crate::config::DocsConfig;
use crate::logging::LoggingConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Generate documentation for a repository in six phases:
/// Discovery → File analysis → Module analysis → Synthesis → Examples → FAQ
#[derive(Parser, Debug, Clone)]
#[command(name = "docs-agent", version)]
pub struct Args {
    /// Repository to document
    pub repository: PathBuf,

    /// Directory for the rendered markdown and `.handoffs/` artifacts
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Never call a provider; every phase runs on local analysis
    #[arg(long)]
    pub offline: bool,

    /// Skip the examples phase (recorded as degraded)
    #[arg(long)]
    pub skip_examples: bool,

    /// Model name sent to the messages API
    #[arg(long)]
    pub model: Option<String>,

    /// Messages API base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Upper bound on a single capability call, in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Files analyzed in parallel
    #[arg(long)]
    pub file_concurrency: Option<usize>,

    /// Debug-level diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Diagnostics as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            use_json: self.json_logs,
            ..LoggingConfig::verbose(self.verbose)
        }
    }
}

/// Environment (and `.env`) first, flags on top
impl From<Args> for DocsConfig {
    fn from(args: Args) -> Self {
        let mut config = DocsConfig::from_env();
        config.repository = args.repository;
        if let Some(output) = args.output {
            config.output_dir = output;
        }
        config.offline = args.offline;
        config.skip_examples = args.skip_examples;
        if let Some(model) = args.model {
            config.model = model;
        }
        if let Some(endpoint) = args.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(secs) = args.timeout_secs {
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(cap) = args.file_concurrency {
            config.limits.file_analysis = cap;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "docs-agent",
            "./repo",
            "--output",
            "./docs",
            "--offline",
            "--skip-examples",
            "--timeout-secs",
            "30",
            "--file-concurrency",
            "4",
        ]);
        let config = DocsConfig::from(args);

        assert_eq!(config.repository, PathBuf::from("./repo"));
        assert_eq!(config.output_dir, PathBuf::from("./docs"));
        assert!(config.offline);
        assert!(config.skip_examples);
        assert!(!config.wants_provider());
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.limits.file_analysis, 4);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = Args::try_parse_from(["docs-agent", ".", "--timeout-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_json_logging() {
        let args = Args::parse_from(["docs-agent", ".", "-v", "--json-logs"]);
        let logging = args.logging();
        assert_eq!(logging.level, tracing::Level::DEBUG);
        assert!(logging.use_json);
    }
}
