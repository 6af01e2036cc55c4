//! Error types and handling for the MCP server.
//!
//! A unified error type wraps the domain errors and configuration failures
//! so the binary and the transports can report them consistently.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the discovery domain.
    #[error("Discovery error: {0}")]
    Discovery(#[from] crate::domains::discovery::DiscoveryError),

    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Missing or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
