//! Route definitions for the ZK gateway.
//!
//! Provides service metadata, health, and the analyze endpoint.

use crate::analyzer::{AnalyzeRequest, AnalyzeResponse, ConflictAnalyzer};
use crate::error::AnalyzeError;
use crate::provider::AnthropicProvider;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use zk_common::config::Config;
use zk_common::logging::trace_id_from_headers;
use zk_common::util::char_len;

/// Human-readable service name reported by `GET /`.
pub const SERVICE_NAME: &str = "ZK Generator Backend";

/// Shared application state.
///
/// Built once at startup and never mutated; `analyzer` is `None` when no
/// credential was configured.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Option<Arc<ConflictAnalyzer>>,
}

impl AppState {
    pub fn new(config: Config, analyzer: Option<ConflictAnalyzer>) -> Self {
        Self {
            config: Arc::new(config),
            analyzer: analyzer.map(Arc::new),
        }
    }

    /// Wire up the Anthropic provider if a credential is present.
    pub fn from_config(config: Config) -> zk_common::Result<Self> {
        let analyzer = match config.api_key() {
            Some(key) => {
                let provider = AnthropicProvider::from_config(key, &config.anthropic)?;
                Some(ConflictAnalyzer::new(
                    Arc::new(provider),
                    config.anthropic.model.clone(),
                    config.anthropic.max_tokens,
                ))
            }
            None => {
                tracing::warn!("ANTHROPIC_API_KEY is not set; /analyze will answer with 500");
                None
            }
        };

        Ok(Self::new(config, analyzer))
    }
}

/// Service metadata response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub version: String,
    pub status: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_key_configured: bool,
}

/// Build the API routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn root_handler() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        service: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        status: "operational".into(),
    })
}

/// Reports credential presence without calling the remote model.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        api_key_configured: state.config.api_key_configured(),
    })
}

async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let trace_id = trace_id_from_headers(&headers);
    let span = tracing::info_span!("analyze", trace_id = %trace_id);

    async move {
        let Some(analyzer) = state.analyzer.as_ref() else {
            tracing::error!("Analyze requested without a configured API key");
            return Err(AnalyzeError::Configuration);
        };

        let text_chars = char_len(&request.text);
        match analyzer.analyze(&request.text).await {
            Ok(response) => {
                tracing::info!(
                    text_chars,
                    confidence = %response.confidence,
                    "Conflict analysis succeeded"
                );
                Ok(Json(response))
            }
            Err(err) => {
                if err.status().is_client_error() {
                    tracing::warn!(text_chars, code = err.code(), error = %err, "Analyze rejected");
                } else {
                    tracing::error!(text_chars, code = err.code(), error = %err, "Analyze failed");
                }
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}
