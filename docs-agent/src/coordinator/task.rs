//! Work items and their outcomes

use crate::config::ConcurrencyLimits;
use crate::provider::{CapabilityOutput, WorkDescriptor};
use std::fmt;

/// Which phase ceiling an item counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConcurrencyClass {
    #[default]
    Default,
    Discovery,
    FileAnalysis,
    ModuleAnalysis,
    Synthesis,
    Examples,
    Faq,
}

impl ConcurrencyClass {
    pub fn cap(self, limits: &ConcurrencyLimits) -> usize {
        match self {
            ConcurrencyClass::Default => limits.default,
            ConcurrencyClass::Discovery => limits.discovery,
            ConcurrencyClass::FileAnalysis => limits.file_analysis,
            ConcurrencyClass::ModuleAnalysis => limits.module_analysis,
            ConcurrencyClass::Synthesis => limits.synthesis,
            ConcurrencyClass::Examples => limits.examples,
            ConcurrencyClass::Faq => limits.faq,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConcurrencyClass::Default => "default",
            ConcurrencyClass::Discovery => "discovery",
            ConcurrencyClass::FileAnalysis => "file_analysis",
            ConcurrencyClass::ModuleAnalysis => "module_analysis",
            ConcurrencyClass::Synthesis => "synthesis",
            ConcurrencyClass::Examples => "examples",
            ConcurrencyClass::Faq => "faq",
        }
    }
}

/// One named unit of work. Names must be unique within a batch.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub name: String,
    pub descriptor: WorkDescriptor,
    pub class: ConcurrencyClass,
}

impl WorkItem {
    pub fn new(name: impl Into<String>, descriptor: WorkDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            class: ConcurrencyClass::Default,
        }
    }

    pub fn with_class(mut self, class: ConcurrencyClass) -> Self {
        self.class = class;
        self
    }
}

/// Result of one work item: exactly one of output or error is present
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    name: String,
    output: Option<CapabilityOutput>,
    error: Option<String>,
}

impl TaskOutcome {
    pub fn succeeded(name: impl Into<String>, output: CapabilityOutput) -> Self {
        Self {
            name: name.into(),
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            output: None,
            error: Some(error.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn success(&self) -> bool {
        self.output.is_some()
    }

    pub fn output(&self) -> Option<&CapabilityOutput> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_result(self) -> Result<CapabilityOutput, String> {
        match (self.output, self.error) {
            (Some(output), _) => Ok(output),
            (None, Some(error)) => Err(error),
            (None, None) => Err("task produced no output".to_string()),
        }
    }
}
