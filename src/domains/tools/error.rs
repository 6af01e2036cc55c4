//! Tool invocation error types.

use thiserror::Error;

use super::model::HttpMethod;

/// Errors that can occur while invoking a tool.
///
/// Display strings carry ids, methods, paths, parameter names and upstream
/// statuses, never argument values.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool id is not in the current catalog.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A `{name}` placeholder in the path template had no argument.
    #[error("Missing value for path parameter '{name}' of {path}")]
    UnresolvedPathParameter { name: String, path: String },

    /// The operation uses a verb the engine does not execute.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(HttpMethod),

    /// The upstream API answered with a 4xx or 5xx status.
    #[error("API call failed with status {status} and body: {body}")]
    Upstream { status: u16, body: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Connection failure or unreadable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The assembled request URL is not valid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Neither an override nor a configured default base URL is available.
    #[error("No base URL available for the API")]
    MissingBaseUrl,

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            // The URL may carry query arguments.
            Self::Transport(err.without_url().to_string())
        }
    }
}
