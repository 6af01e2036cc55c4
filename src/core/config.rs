//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from `MCP_`-prefixed environment
//! variables, optionally seeded from a `.env` file.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Description source and upstream API settings.
    pub api: ApiConfig,

    /// Authentication header sent with every API call.
    pub auth: AuthConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Description source and upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Locator of the Swagger/OpenAPI description document.
    pub swagger_url: Option<String>,

    /// Static base URL for API calls. When unset the base URL is derived
    /// from the description document.
    pub base_url: Option<String>,

    /// Headers added to every API call, in configuration order.
    pub headers: Vec<(String, String)>,

    /// Timeout for each outbound request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Serve an empty catalog instead of fetching the description.
    pub skip_discovery: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            swagger_url: None,
            base_url: None,
            headers: Vec::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            skip_discovery: false,
        }
    }
}

/// Authentication header parts.
///
/// The header is sent as `<header_name>: <header_prefix> <token>` and only
/// when all three parts are set.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub header_name: Option<String>,
    pub header_prefix: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

/// Custom Debug implementation to redact the token from logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("header_name", &self.header_name)
            .field("header_prefix", &self.header_prefix)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "swagger-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SWAGGER_URL`, `MCP_AUTH_TOKEN`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        config.api.swagger_url = env_non_empty("MCP_SWAGGER_URL");
        config.api.base_url = env_non_empty("MCP_API_BASE_URL");

        if let Some(headers) = env_non_empty("MCP_REST_HEADERS") {
            config.api.headers = parse_headers(&headers);
        }

        if let Some(timeout) = env_non_empty("MCP_REQUEST_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) if ms > 0 => config.api.request_timeout_ms = ms,
                _ => warn!(
                    "Invalid MCP_REQUEST_TIMEOUT_MS '{}', using {} ms",
                    timeout, DEFAULT_REQUEST_TIMEOUT_MS
                ),
            }
        }

        config.api.skip_discovery = std::env::var("MCP_SKIP_DISCOVERY")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        config.auth = AuthConfig {
            header_name: env_non_empty("MCP_AUTH_HEADER_NAME"),
            header_prefix: env_non_empty("MCP_AUTH_HEADER_PREFIX"),
            token: env_non_empty("MCP_AUTH_TOKEN"),
        };

        config
    }

    /// Check the configuration before the server starts.
    pub fn validate(&self) -> super::Result<()> {
        if self.api.swagger_url.is_none() {
            return Err(super::Error::config(
                "MCP_SWAGGER_URL must be set to the location of the API description",
            ));
        }
        if self.api.request_timeout_ms == 0 {
            return Err(super::Error::config("request timeout must be positive"));
        }

        let auth = &self.auth;
        let parts = [&auth.header_name, &auth.header_prefix, &auth.token];
        let set = parts.iter().filter(|p| p.is_some()).count();
        if set > 0 && set < parts.len() {
            warn!(
                "Authentication header is partially configured and will not be sent; \
                 set MCP_AUTH_HEADER_NAME, MCP_AUTH_HEADER_PREFIX and MCP_AUTH_TOKEN"
            );
        }
        Ok(())
    }
}

pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `Name=Value` pairs separated by commas, keeping their order.
fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

// Serializes tests that touch process environment variables.
#[cfg(test)]
pub(crate) static ENV_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
