//! Error types for the analyze endpoint.

use crate::provider::ProviderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Everything that can end an `/analyze` request.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("API key not configured. Please set ANTHROPIC_API_KEY environment variable.")]
    Configuration,

    #[error("{0}")]
    Validation(String),

    #[error("Anthropic API error: {0}")]
    Upstream(String),

    #[error("Failed to parse model response as JSON: {0}")]
    Parse(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AnalyzeError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration | Self::Parse(_) | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

impl From<ProviderError> for AnalyzeError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::EmptyContent { .. } => Self::Unexpected(err.to_string()),
            ProviderError::Transport { .. }
            | ProviderError::Status { .. }
            | ProviderError::Decode { .. } => Self::Upstream(err.to_string()),
        }
    }
}

impl From<zk_common::Error> for AnalyzeError {
    fn from(err: zk_common::Error) -> Self {
        match err {
            zk_common::Error::Config(_) => Self::Configuration,
            zk_common::Error::InvalidInput(msg) => Self::Validation(msg),
            zk_common::Error::Json(e) => Self::Parse(e.to_string()),
            zk_common::Error::Internal(msg) => Self::Unexpected(msg),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.code().to_string(),
        };

        (self.status(), axum::Json(body)).into_response()
    }
}
