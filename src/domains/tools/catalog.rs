//! The catalog produced by one discovery pass.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use super::model::ToolDefinition;

/// Every tool of one discovery pass, keyed by id in discovery order.
///
/// A catalog is populated once and then only read. Re-discovery builds a new
/// catalog instead of mutating a published one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    tools: IndexMap<String, ToolDefinition>,

    /// Declared version of the source document (diagnostics only).
    #[serde(skip_serializing_if = "Option::is_none")]
    spec_version: Option<String>,

    /// Default server URL declared by the document, already absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    server_url: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec_version(mut self, version: impl Into<String>) -> Self {
        self.spec_version = Some(version.into());
        self
    }

    pub fn with_server_url(mut self, url: Option<String>) -> Self {
        self.server_url = url;
        self
    }

    /// Add a tool. An id seen before is replaced (last write wins).
    pub fn insert(&mut self, tool: ToolDefinition) {
        if let Some(previous) = self.tools.insert(tool.id.clone(), tool) {
            warn!(
                "Duplicate tool id '{}' ({} {}), keeping the later operation",
                previous.id, previous.http_method, previous.path
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&ToolDefinition> {
        self.tools.get(id)
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn spec_version(&self) -> Option<&str> {
        self.spec_version.as_deref()
    }

    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }
}
