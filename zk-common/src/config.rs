//! Configuration management for ZK services.
//!
//! Configuration is read once at startup from an optional JSON file and then
//! overlaid with environment variables.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ZK_CONFIG` → path of the config file (default `./zk-gateway.json`)
//! - `ANTHROPIC_API_KEY` → anthropic.api_key
//! - `ANTHROPIC_BASE_URL` → anthropic.base_url
//! - `ZK_MODEL` → anthropic.model
//! - `ZK_HOST` → server.host
//! - `PORT` / `ZK_PORT` → server.port (`ZK_PORT` wins)
//! - `ZK_CORS_ORIGINS` → server.cors_origins (comma separated)
//! - `ZK_LOG_LEVEL` → observability.log_level
//! - `ZK_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "zk-gateway.json";

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var("ZK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the ZK generator backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inbound HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound language-model settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.anthropic.base_url = url;
        }
        if let Some(model) = lookup("ZK_MODEL") {
            self.anthropic.model = model;
        }

        if let Some(host) = lookup("ZK_HOST") {
            self.server.host = host;
        }
        for var in ["PORT", "ZK_PORT"] {
            if let Some(port) = lookup(var) {
                match port.parse() {
                    Ok(p) => self.server.port = p,
                    Err(_) => tracing::warn!(var, value = %port, "Ignoring invalid port"),
                }
            }
        }
        if let Some(origins) = lookup("ZK_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(level) = lookup("ZK_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ZK_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Check values that would otherwise fail later at bind or request time.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(crate::Error::Config("server.port must be non-zero".into()));
        }
        if self.anthropic.timeout_secs == 0 {
            return Err(crate::Error::Config(
                "anthropic.timeout_secs must be non-zero".into(),
            ));
        }
        if self.anthropic.max_tokens == 0 {
            return Err(crate::Error::Config(
                "anthropic.max_tokens must be non-zero".into(),
            ));
        }
        if self.anthropic.model.trim().is_empty() {
            return Err(crate::Error::Config("anthropic.model is empty".into()));
        }
        if !(self.anthropic.base_url.starts_with("http://")
            || self.anthropic.base_url.starts_with("https://"))
        {
            return Err(crate::Error::Config(format!(
                "anthropic.base_url is not an http(s) URL: {}",
                self.anthropic.base_url
            )));
        }
        Ok(())
    }

    /// The outbound credential, if one is configured.
    ///
    /// Blank values count as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.anthropic
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Whether `/analyze` can reach the remote model at all.
    pub fn api_key_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "https://burmeister12439-futur2.github.io".into(),
        "http://localhost:3000".into(),
    ]
}

// ============================================================================
// Anthropic Configuration
// ============================================================================

/// Outbound language-model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (usually supplied through `ANTHROPIC_API_KEY`)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL, without the `/v1/messages` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_version: default_api_version(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com".into()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_version() -> String {
    "2023-06-01".into()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.anthropic.model, "claude-sonnet-4-20250514");
        assert_eq!(config.anthropic.max_tokens, 500);
        assert_eq!(config.anthropic.timeout_secs, 30);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert!(!config.api_key_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 9100}}, "anthropic": {{"model": "claude-3-5-haiku-20241022"}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.anthropic.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.anthropic.max_tokens, 500);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("PORT", "7000"),
            ("ZK_PORT", "7100"),
            ("ZK_CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("ZK_LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.api_key(), Some("sk-ant-test"));
        assert_eq!(config.server.port, 7100);
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[("PORT", "eighty")]));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = Config::default();
        config.anthropic.api_key = Some("   ".into());
        assert_eq!(config.api_key(), None);
        assert!(!config.api_key_configured());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-ant-secret"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.anthropic.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));

        let mut config = Config::default();
        config.anthropic.base_url = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }
}
