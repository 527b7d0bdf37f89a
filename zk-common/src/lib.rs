//! ZK Common - Shared configuration, errors, and logging for the ZK generator backend.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and HTTP status mapping
//! - Logging setup and trace ID helpers
//! - Character-safe string utilities

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub use config::{AnthropicConfig, Config, ObservabilityConfig, ServerConfig};
pub use error::{Error, Result};
