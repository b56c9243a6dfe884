//! Diagnostic logging setup
//!
//! Library code logs through `tracing` macros. Only the binary installs a
//! subscriber; pipeline progress itself goes through the injected
//! `PipelineObserver`, not through this layer.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to this crate when `RUST_LOG` does not say otherwise
    pub level: Level,
    pub use_json: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    pub fn verbose(verbose: bool) -> Self {
        Self {
            level: if verbose { Level::DEBUG } else { Level::INFO },
            ..Default::default()
        }
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("docs_agent={}", config.level).parse() {
            filter = filter.add_directive(directive);
        }

        // Diagnostics go to stderr alongside observer events
        let registry = tracing_subscriber::registry().with(filter);
        // Another subscriber may already be installed by an embedding binary
        let _ = if config.use_json {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .try_init()
        };
    });
}
