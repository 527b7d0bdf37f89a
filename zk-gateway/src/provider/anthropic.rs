//! Anthropic (Claude) provider implementation.

use super::{ChatRequest, ChatResponse, Provider, ProviderError, TokenUsage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use zk_common::config::AnthropicConfig;

const PROVIDER: &str = "anthropic";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    /// Create a provider from the outbound configuration.
    ///
    /// Fails when the key cannot be sent as a header value.
    pub fn from_config(api_key: &str, config: &AnthropicConfig) -> zk_common::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut key = HeaderValue::from_str(api_key).map_err(|_| {
            zk_common::Error::Config("API key contains characters not allowed in a header".into())
        })?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let version = HeaderValue::from_str(&config.api_version).map_err(|_| {
            zk_common::Error::Config(format!(
                "Invalid anthropic-version header: {}",
                config.api_version
            ))
        })?;
        headers.insert("anthropic-version", version);

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| zk_common::Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> ProviderError {
        let message = if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else {
            err.to_string()
        };
        ProviderError::Transport {
            provider: PROVIDER.into(),
            message,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();
        let url = format!("{}/v1/messages", self.base_url);

        let anthropic_request = AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: request
                .messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                provider: PROVIDER.into(),
                message: e.to_string(),
            })?;

        let content = anthropic_response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| ProviderError::EmptyContent {
                provider: PROVIDER.into(),
            })?;

        Ok(ChatResponse {
            provider: PROVIDER.into(),
            model: anthropic_response.model.unwrap_or(request.model),
            content,
            usage: TokenUsage {
                input_tokens: anthropic_response.usage.input_tokens,
                output_tokens: anthropic_response.usage.output_tokens,
            },
            finish_reason: anthropic_response.stop_reason,
            latency_ms,
        })
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}
