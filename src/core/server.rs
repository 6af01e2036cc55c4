//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol on top of the tool registry.
//!
//! ## Tool Architecture
//!
//! Tools are not compiled in. They come from the catalog the registry
//! publishes after each discovery pass, so listing and dispatch always read
//! the current catalog rather than a router built at startup.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{Arguments, ToolError, ToolRegistry, arguments_from_json};

const INSTRUCTIONS: &str = "Each tool calls one operation of the configured REST API. \
    Tool arguments fill the operation's path, query and header parameters; \
    the `body` argument carries the JSON request body.";

/// The main MCP server handler.
///
/// Cloning is cheap; clones share the registry and therefore the published
/// catalog.
#[derive(Clone)]
pub struct SwaggerMcpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry holding the published catalog.
    registry: Arc<ToolRegistry>,
}

impl SwaggerMcpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// The catalog starts empty; call [`SwaggerMcpServer::refresh`] to load it.
    pub fn new(config: Config) -> super::Result<Self> {
        let config = Arc::new(config);
        let registry = Arc::new(ToolRegistry::new(config.clone())?);
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an existing registry.
    pub fn with_registry(config: Arc<Config>, registry: Arc<ToolRegistry>) -> Self {
        Self { config, registry }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    /// Re-run discovery and publish the new catalog.
    pub async fn refresh(&self) -> super::Result<usize> {
        self.registry.refresh().await
    }

    /// List all available tools as JSON (for HTTP transport).
    pub async fn list_tools_json(&self) -> Vec<serde_json::Value> {
        self.registry
            .list_tools()
            .await
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Invoke a tool and return the raw result string.
    pub async fn invoke(
        &self,
        id: &str,
        args: &Arguments,
        base_url_override: Option<&str>,
    ) -> Result<String, ToolError> {
        self.registry.call_tool(id, args, base_url_override).await
    }

    /// Invoke a tool and wrap the outcome as a protocol result.
    ///
    /// An unknown tool is a protocol error. Every other failure becomes a
    /// tool result flagged as an error, carrying the failure's message.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args = arguments.map(arguments_from_json).unwrap_or_default();
        match self.invoke(name, &args, None).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e @ ToolError::NotFound(_)) => Err(McpError::invalid_params(e.to_string(), None)),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

impl ServerHandler for SwaggerMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.registry.list_tools().await;
        info!("Listing {} tools", tools.len());
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    // Arguments are not recorded on the span.
    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        self.call(&request.name, request.arguments).await
    }
}
