/*
  docs-agent: six-phase repository documentation

    Discovery        classify files, detect stack, explore directories, summarize
    FileAnalysis     per-file extraction (+ capability judgement when online)
    ModuleAnalysis   modules, dependency graph, architecture insights
    Synthesis        overview, architecture, module pages, API reference
    Examples         templated + generated code examples   (may degrade)
    FAQ              frequently asked questions            (may degrade)

  Every phase document lands in <output>/.handoffs/<phase>.yaml, the rendered
  markdown in <output>/.

EXAMPLE COMMANDS:

  # Local analysis only
  docs-agent ./my-project --offline --output ./docs

  # With a provider (ANTHROPIC_API_KEY from the environment or .env)
  docs-agent ./my-project --output ./docs --file-concurrency 5

  # Skip examples, verbose JSON diagnostics
  docs-agent ./my-project --skip-examples -v --json-logs
*/

use anyhow::Context;
use clap::Parser;
use docs_agent::cli::Args;
use docs_agent::logging::init_logging;
use docs_agent::{DocsConfig, PhasePipeline};
use docs_agent_sdk::StderrObserver;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.logging());

    let config: DocsConfig = args.into();
    if !config.offline && config.api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set, running on local analysis only");
    }

    let pipeline = PhasePipeline::new(config)
        .context("Failed to set up pipeline")?
        .with_observer(Arc::new(StderrObserver));
    let report = pipeline.run().await?;

    for (phase, status) in &report.phases {
        println!("  {:<15} {:?}", phase.name(), status);
    }
    match report.failure() {
        None => {
            println!("\n✅ Documentation written to {}", report.output_dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(failure) => {
            eprintln!("\n❌ {}", failure);
            Ok(ExitCode::FAILURE)
        }
    }
}
