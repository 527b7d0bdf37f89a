//! Log setup and trace IDs for the gateway.
//!
//! Each `/analyze` call goes out through reqwest and comes in through axum's
//! hyper stack; at `debug` those crates log every connection and frame. The
//! filter pins them to `warn` so the gateway's own request and model events
//! stay readable. `RUST_LOG` replaces the whole filter when set.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// HTTP client and server crates capped at `warn`.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "tower_http",
];

/// Header carrying a caller-supplied trace ID.
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

fn filter_directives(log_level: &str) -> String {
    NOISY_MODULES
        .iter()
        .fold(String::from(log_level), |mut directives, module| {
            directives.push_str(&format!(",{module}=warn"));
            directives
        })
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)))
}

/// Install the global subscriber.
///
/// `log_format` `"json"` emits one object per event with the enclosing
/// `analyze` span (and its `trace_id`) attached, plus a close event carrying
/// the span's duration. Any other value prints colored single lines.
///
/// A subscriber that is already installed is left in place.
pub fn init_logging(log_level: &str, log_format: &str) {
    let registry = tracing_subscriber::registry().with(build_filter(log_level));

    let installed = match log_format {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_ansi(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            log_level = %log_level,
            log_format = %log_format,
            quiet_modules = NOISY_MODULES.len(),
            "Logging initialized"
        );
    }
}

/// Generate a new trace ID for request tracing.
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Take the trace ID from request headers, or mint a fresh one.
pub fn trace_id_from_headers(headers: &http::HeaderMap) -> String {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(generate_trace_id)
}
