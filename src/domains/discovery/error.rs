//! Discovery error types.

use thiserror::Error;

/// Errors that abort a discovery pass.
///
/// Neither variant leaves a partial catalog behind.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The description document could not be retrieved as text.
    #[error("Failed to fetch API description from '{locator}': {reason}")]
    Fetch { locator: String, reason: String },

    /// No parser backend could build a document from the text.
    #[error("Failed to parse API description: {0}")]
    Parse(String),
}

impl DiscoveryError {
    /// Create a new fetch error.
    pub fn fetch(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
