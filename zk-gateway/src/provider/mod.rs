//! Provider abstraction for the remote language model.
//!
//! The analyzer only depends on the [`Provider`] trait, so tests and future
//! backends can stand in for the Anthropic API.

mod anthropic;

pub use anthropic::AnthropicProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for LLM providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Send a single-shot chat request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Error from a provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("[{provider}] request failed: {message}")]
    Transport { provider: String, message: String },

    /// The API answered with a non-success status.
    #[error("[{provider}] API error: {status} - {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The reply body was not the expected envelope.
    #[error("[{provider}] failed to decode response: {message}")]
    Decode { provider: String, message: String },

    /// The reply had no text in its first content block.
    #[error("[{provider}] response contained no text content")]
    EmptyContent { provider: String },
}

impl ProviderError {
    /// HTTP status returned by the remote API, if it got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Unified chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Request with a single user turn.
    pub fn user(model: impl Into<String>, max_tokens: u32, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message {
                role: "user".into(),
                content: content.into(),
            }],
            max_tokens,
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Unified chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider name
    pub provider: String,
    /// Model reported by the provider
    pub model: String,
    /// Text of the first content block
    pub content: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Response latency in milliseconds
    pub latency_ms: u64,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_request_has_single_message() {
        let request = ChatRequest::user("claude-sonnet-4-20250514", 500, "Hallo");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "Hallo");
        assert_eq!(request.max_tokens, 500);
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Status {
            provider: "anthropic".into(),
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "[anthropic] API error: 429 - rate limited");
        assert_eq!(err.status_code(), Some(429));

        let err = ProviderError::EmptyContent {
            provider: "anthropic".into(),
        };
        assert_eq!(err.status_code(), None);
    }
}
