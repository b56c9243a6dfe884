//! Common test utilities for pipeline tests

use async_trait::async_trait;
use docs_agent::error::ProviderError;
use docs_agent::pipeline::prompts;
use docs_agent::provider::{CapabilityOutput, CapabilityProvider, WorkDescriptor};
use docs_agent::DocsConfig;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

type FailWhen = Box<dyn Fn(&WorkDescriptor) -> bool + Send + Sync>;

/// In-memory provider answering by system prompt
///
/// Tracks how many calls are in flight and the highest value seen.
pub struct ScriptedProvider {
    delay: Duration,
    fail_when: FailWhen,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(0),
            fail_when: Box::new(|_| false),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_when(
        mut self,
        predicate: impl Fn(&WorkDescriptor) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Box::new(predicate);
        self
    }

    /// Fail every call made with the given system prompt
    pub fn failing_system(self, system: &'static str) -> Self {
        self.failing_when(move |work| work.system_prompt.as_deref() == Some(system))
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, work: &WorkDescriptor) -> Result<CapabilityOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = if (self.fail_when)(work) {
            Err(ProviderError::Unavailable("scripted outage".to_string()))
        } else {
            Ok(CapabilityOutput::Raw(answer(work).to_string()))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn answer(work: &WorkDescriptor) -> &'static str {
    match work.system_prompt.as_deref() {
        Some(prompts::DISCOVERY_SYSTEM) => "A small Python service exposing users.",
        Some(prompts::EXAMPLES_SYSTEM) => {
            "### Integration With A Scheduler\n\
             Runs the service on a timer.\n\
             ```python\nfrom app.service import Service\nService().run()\n```\n"
        }
        Some(prompts::FAQ_SYSTEM) => {
            "## Q: How do I run it?\n**A:** `python main.py`\n\n---\n\n\
             ## Q: Where are users defined?\n**A:** In `app/models.py`.\n"
        }
        Some(prompts::FILE_ANALYSIS_SYSTEM) => {
            "PURPOSE: Part of the user service\nCOMPLEXITY: 4\nKEY INSIGHTS:\n\
             - Keeps the user model free of persistence code\n"
        }
        _ => "- The service layer depends on the models module only",
    }
}

/// Small Python repository:
/// `main.py`, `app/service.py` (imports `.models`), `app/models.py`
pub fn fixture_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.py", "import app.service\n\ndef main():\n    app.service.Service().run()\n");
    write(
        dir.path(),
        "app/service.py",
        "from .models import User\n\nclass Service:\n    def run(self):\n        return User()\n",
    );
    write(dir.path(), "app/models.py", "class User:\n    \"\"\"A user.\"\"\"\n    pass\n");
    write(dir.path(), "requirements.txt", "flask\n");
    write(dir.path(), "README.md", "# Fixture\n");
    dir
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Config for `repo` writing into `output`, no key and no `.env` lookup
pub fn config_for(repo: &Path, output: &Path) -> DocsConfig {
    DocsConfig {
        output_dir: output.to_path_buf(),
        ..DocsConfig::for_repository(repo)
    }
}
