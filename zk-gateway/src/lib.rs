//! ZK Gateway - HTTP backend for target-conflict analysis.
//!
//! This crate provides:
//! - `POST /analyze`: forwards German text to a language model and returns the
//!   two opposing poles of its central target conflict
//! - `GET /health` and `GET /` for health checks and metadata
//! - A provider abstraction with an Anthropic Messages API implementation
//!
//! ## Architecture
//!
//! ```text
//! Client → Gateway (validate → truncate → prompt) → Anthropic API
//!                         ↓
//!          strip fences → parse JSON → clean poles → Client
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analyzer;
pub mod error;
pub mod provider;
pub mod routes;

pub use analyzer::{AnalyzeRequest, AnalyzeResponse, ConflictAnalyzer};
pub use error::{AnalyzeError, ErrorResponse};
pub use provider::{AnthropicProvider, ChatRequest, ChatResponse, Provider, ProviderError};
pub use routes::AppState;

use axum::http::HeaderValue;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use zk_common::config::Config;

/// Largest accepted request body (1 MiB).
///
/// Only the first 2000 characters of a text reach the model, so anything
/// near this size is already mostly discarded. Larger bodies are answered
/// with `413 Payload Too Large` before the handler runs.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the CORS layer for the configured browser origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out `*`, so methods and headers mirror the preflight.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the gateway router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    routes::api_routes(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

/// Start the gateway server.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!(
        model = %config.anthropic.model,
        api_key_configured = config.api_key_configured(),
        origins = config.server.cors_origins.len(),
        "Gateway configured"
    );

    let router = build_router(AppState::from_config(config)?);

    tracing::info!("Starting ZK Gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ZK Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
