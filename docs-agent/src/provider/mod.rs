//! Capability provider boundary
//!
//! A provider takes a [`WorkDescriptor`] and returns either structured data
//! or free text. The core never inspects which backend it is talking to.

pub mod messages_api;

pub use messages_api::MessagesApiProvider;

use crate::error::ProviderError;
use async_trait::async_trait;

/// What shape of answer the caller expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    #[default]
    Text,
    /// A YAML/JSON mapping or list; anything else is a malformed response
    Structured,
}

/// Everything a provider needs to perform one unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct WorkDescriptor {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub expect: OutputShape,
}

impl WorkDescriptor {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: 0.3,
            max_tokens: 4000,
            expect: OutputShape::Text,
        }
    }

    pub fn structured(prompt: impl Into<String>) -> Self {
        Self {
            expect: OutputShape::Structured,
            ..Self::text(prompt)
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Result of a successful capability call
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Structured(serde_json::Value),
    Raw(String),
}

impl CapabilityOutput {
    /// Text view of either branch, for prompts and markdown
    pub fn to_text(&self) -> String {
        match self {
            CapabilityOutput::Raw(text) => text.clone(),
            CapabilityOutput::Structured(value) => {
                serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Short one-line preview for progress events
    pub fn summary(&self) -> String {
        let text = self.to_text();
        let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        truncate_chars(first.trim(), 80)
    }
}

#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, work: &WorkDescriptor) -> Result<CapabilityOutput, ProviderError>;
}

/// Turn a provider's raw completion into the requested output shape
pub fn shape_output(text: String, expect: OutputShape) -> Result<CapabilityOutput, ProviderError> {
    match expect {
        OutputShape::Text => Ok(CapabilityOutput::Raw(text)),
        OutputShape::Structured => crate::yaml::parse_structured(&text)
            .map(CapabilityOutput::Structured)
            .map_err(|e| ProviderError::MalformedResponse(format!("{:#}", e))),
    }
}

/// Cut `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
