//! Transport selection.
//!
//! `MCP_TRANSPORT` picks how MCP clients reach the server: `stdio` (the
//! default) or `http`, which also serves the REST tool endpoints.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[cfg(feature = "http")]
use crate::core::config::env_non_empty;

#[cfg(feature = "http")]
const DEFAULT_HTTP_PORT: u16 = 8080;

/// How the server is exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// MCP over standard input/output.
    #[cfg(feature = "stdio")]
    Stdio,

    /// JSON-RPC over POST plus the REST tool surface.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP listener settings.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Route of the JSON-RPC endpoint. Always starts with `/`.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Read `MCP_HTTP_*` variables, falling back to defaults with a warning
    /// on unusable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = env_non_empty("MCP_HTTP_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!(
                    "Invalid MCP_HTTP_PORT '{}', using {}",
                    port, DEFAULT_HTTP_PORT
                ),
            }
        }
        if let Some(host) = env_non_empty("MCP_HTTP_HOST") {
            config.host = host;
        }
        if let Some(path) = env_non_empty("MCP_HTTP_PATH") {
            config.rpc_path = normalize_rpc_path(&path);
        }
        if let Some(cors) = env_non_empty("MCP_HTTP_CORS") {
            config.enable_cors = !matches!(cors.to_lowercase().as_str(), "false" | "0" | "no");
        }
        config
    }

    /// `host:port` for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(feature = "http")]
fn normalize_rpc_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed {
        "" => default_rpc_path(),
        p if p.starts_with('/') => p.to_string(),
        p => format!("/{}", p),
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

impl TransportConfig {
    /// Select the transport from `MCP_TRANSPORT`.
    ///
    /// Unknown or unavailable names fall back to the default transport.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env()),
            #[cfg(feature = "stdio")]
            "stdio" => Self::Stdio,
            "" => Self::default(),
            other => {
                let fallback = Self::default();
                warn!(
                    "Unknown transport '{}', using {}",
                    other,
                    fallback.description()
                );
                fallback
            }
        }
    }

    /// Human-readable form for startup logs.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}{}", cfg.bind_address(), cfg.rpc_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ENV_TEST_LOCK;

    const TRANSPORT_VARS: [&str; 5] = [
        "MCP_TRANSPORT",
        "MCP_HTTP_PORT",
        "MCP_HTTP_HOST",
        "MCP_HTTP_PATH",
        "MCP_HTTP_CORS",
    ];

    fn with_env(vars: &[(&str, &str)], check: impl FnOnce()) {
        let _lock = ENV_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        unsafe {
            for var in TRANSPORT_VARS {
                std::env::remove_var(var);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }
        check();
        unsafe {
            for var in TRANSPORT_VARS {
                std::env::remove_var(var);
            }
        }
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_unset_and_unknown_transport_use_default() {
        with_env(&[], || assert_eq!(TransportConfig::from_env(), TransportConfig::Stdio));
        with_env(&[("MCP_TRANSPORT", "carrier-pigeon")], || {
            assert_eq!(TransportConfig::from_env(), TransportConfig::Stdio)
        });
        with_env(&[("MCP_TRANSPORT", " STDIO ")], || {
            assert_eq!(TransportConfig::from_env(), TransportConfig::Stdio)
        });
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_transport_from_env() {
        let vars = [
            ("MCP_TRANSPORT", "http"),
            ("MCP_HTTP_PORT", "9090"),
            ("MCP_HTTP_HOST", "0.0.0.0"),
            ("MCP_HTTP_PATH", "rpc/"),
            ("MCP_HTTP_CORS", "no"),
        ];
        with_env(&vars, || {
            let TransportConfig::Http(cfg) = TransportConfig::from_env() else {
                panic!("expected http transport");
            };
            assert_eq!(cfg.bind_address(), "0.0.0.0:9090");
            assert_eq!(cfg.rpc_path, "/rpc");
            assert!(!cfg.enable_cors);
        });
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_invalid_port_falls_back_to_default() {
        with_env(&[("MCP_TRANSPORT", "http"), ("MCP_HTTP_PORT", "70000")], || {
            let TransportConfig::Http(cfg) = TransportConfig::from_env() else {
                panic!("expected http transport");
            };
            assert_eq!(cfg, HttpConfig::default());
        });
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_normalize_rpc_path() {
        assert_eq!(normalize_rpc_path("/mcp"), "/mcp");
        assert_eq!(normalize_rpc_path("jsonrpc"), "/jsonrpc");
        assert_eq!(normalize_rpc_path("/"), "/mcp");
    }
}
