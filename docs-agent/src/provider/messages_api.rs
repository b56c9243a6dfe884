//! HTTP provider for an Anthropic-style Messages API

use super::{shape_output, CapabilityOutput, CapabilityProvider, WorkDescriptor};
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const API_VERSION: &str = "2023-06-01";

pub struct MessagesApiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    http_client: Client,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesApiProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            http_client,
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            error!("Messages API request timed out after {:?}", self.timeout);
            ProviderError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            error!("Cannot connect to {}", self.endpoint);
            ProviderError::Unavailable(format!("connection failed: {}", e))
        } else {
            ProviderError::Unavailable(format!("request failed: {}", e))
        }
    }
}

fn map_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Configuration(format!("HTTP {}: check the API key", status)),
        429 => ProviderError::RateLimited { retry_after },
        400..=499 => ProviderError::MalformedResponse(format!("HTTP {}: {}", status, body)),
        _ => ProviderError::Unavailable(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl CapabilityProvider for MessagesApiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, work: &WorkDescriptor) -> Result<CapabilityOutput, ProviderError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: work.max_tokens,
            temperature: work.temperature,
            system: work.system_prompt.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &work.prompt,
            }],
        };

        debug!(
            model = %self.model,
            prompt_chars = work.prompt.len(),
            "Sending Messages API request"
        );
        let start = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            warn!("Messages API returned {}: {}", status, body);
            return Err(map_status(status, &body, retry_after));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("JSON parse error: {}", e))
        })?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ProviderError::MalformedResponse(
                "response contained no text blocks".to_string(),
            ));
        }
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Messages API response was cut at max_tokens");
        }

        debug!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            chars = text.len(),
            "Messages API request completed"
        );

        shape_output(text, work.expect)
    }
}
