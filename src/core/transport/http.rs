//! HTTP transport implementation.
//!
//! HTTP server with JSON-RPC over POST requests, plus a small REST surface
//! over the tool catalog:
//!
//! - `GET /tools` lists the published catalog
//! - `POST /tools/{tool_id}/invoke` calls a tool with a JSON argument object
//! - `POST /tools/refresh` re-runs discovery
//! - `GET /health` reports liveness and the published tool count

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::SwaggerMcpServer;
use crate::domains::tools::{ToolError, arguments_from_json};

/// MCP protocol revision announced on `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Argument entry that overrides the base URL of one REST invocation.
const BASE_URL_OVERRIDE_KEY: &str = "_apiBaseUrl";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: SwaggerMcpServer,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Build the router for the given server.
    pub fn router(&self, server: SwaggerMcpServer) -> Router {
        let mut app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route("/tools", get(list_tools))
            .route("/tools/refresh", post(refresh_tools))
            .route("/tools/{tool_id}/invoke", post(invoke_tool))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(AppState { server });

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }
        app
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: SwaggerMcpServer) -> TransportResult<()> {
        let addr = self.config.bind_address();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  JSON-RPC: POST {}", self.config.rpc_path);
        info!("  Tools:    GET /tools, POST /tools/{{tool_id}}/invoke, POST /tools/refresh");
        info!("  Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "tools": "/tools",
            "invoke": "/tools/{tool_id}/invoke",
            "refresh": "/tools/refresh",
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0"
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.server.registry().catalog().await;
    Json(json!({
        "status": "healthy",
        "tools": catalog.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// List the published catalog.
async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.server.registry().catalog().await;
    let tools: Vec<_> = catalog.tools().collect();
    Json(json!({
        "count": tools.len(),
        "specVersion": catalog.spec_version(),
        "tools": tools
    }))
}

/// Re-run discovery.
#[instrument(skip_all)]
async fn refresh_tools(State(state): State<AppState>) -> impl IntoResponse {
    match state.server.refresh().await {
        Ok(count) => (StatusCode::OK, Json(json!({ "tools": count }))),
        Err(e) => {
            warn!("Refresh failed: {}", e);
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// Invoke one tool with a JSON object of arguments.
#[instrument(skip_all)]
async fn invoke_tool(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    info!("REST invocation of tool {}", tool_id);
    let mut arguments = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Map::new()
    } else {
        match serde_json::from_slice::<serde_json::Map<String, Value>>(&body) {
            Ok(map) => map,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("Arguments must be a JSON object: {}", e) })),
                );
            }
        }
    };

    let base_url_override = arguments
        .remove(BASE_URL_OVERRIDE_KEY)
        .and_then(|v| v.as_str().map(str::to_string));
    let args = arguments_from_json(arguments);

    match state
        .server
        .invoke(&tool_id, &args, base_url_override.as_deref())
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({ "toolId": tool_id, "result": result })),
        ),
        Err(e) => (status_for(&e), Json(json!({ "error": e.to_string() }))),
    }
}

fn status_for(error: &ToolError) -> StatusCode {
    match error {
        ToolError::NotFound(_) => StatusCode::NOT_FOUND,
        ToolError::UnresolvedPathParameter { .. }
        | ToolError::InvalidArguments(_)
        | ToolError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
        ToolError::Upstream { .. } | ToolError::Transport(_) => StatusCode::BAD_GATEWAY,
        ToolError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ToolError::InvalidUrl(_) | ToolError::MissingBaseUrl | ToolError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Handle JSON-RPC requests.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    tracing::Span::current().record("method", &request.method);
    info!("Received JSON-RPC request: {}", request.method);

    let response = process_request(&state, request).await;

    (StatusCode::OK, Json(response))
}

/// Process a JSON-RPC request and return the response.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::invalid_request(request.id);
    }

    match request.method.as_str() {
        "initialize" => handle_initialize(state, request),
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(state, request).await,
        "tools/call" => handle_tools_call(state, request).await,

        // Notifications (no response needed for stateless HTTP)
        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            JsonRpcResponse::success(request.id, Value::Null)
        }

        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Handle initialize request.
fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": state.server.instructions()
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
async fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let tools = state.server.list_tools_json().await;
    info!("Processing tools/list request ({} tools)", tools.len());

    JsonRpcResponse::success(request.id, json!({ "tools": tools }))
}

/// Handle tools/call request.
async fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };
    info!("Processing tools/call request for {}", name);

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            return JsonRpcResponse::invalid_params(request.id, "Arguments must be an object");
        }
    };

    match state.server.call(name, arguments).await {
        Ok(result) => match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::invalid_params(request.id, e.message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::discovery::discover_text;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Starts an upstream API and the transport in front of it.
    async fn start() -> (String, String, reqwest::Client) {
        let upstream = spawn(
            Router::new()
                .route(
                    "/items/{id}",
                    get(|Path(id): Path<String>| async move { format!("item {}", id) }),
                )
                .route("/alt/items/{id}", get(|| async { "alt" })),
        )
        .await;

        let mut config = Config::default();
        config.api.base_url = Some(upstream.clone());
        config.api.skip_discovery = true;
        let server = SwaggerMcpServer::new(config).unwrap();
        let text = r#"{"openapi": "3.0.0", "info": {"title": "t"}, "paths": {
            "/items/{id}": {"get": {"operationId": "getItem", "summary": "Get one item",
                "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}]}}
        }}"#;
        server
            .registry()
            .publish(discover_text(text, None).unwrap())
            .await;

        let transport = HttpTransport::new(HttpConfig::default());
        let base = spawn(transport.router(server)).await;
        (base, upstream, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_rest_list_and_invoke() {
        let (base, _, client) = start().await;

        let listing: Value = client
            .get(format!("{}/tools", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listing["count"], 1);
        assert_eq!(listing["tools"][0]["id"], "getItem");

        let response = client
            .post(format!("{}/tools/getItem/invoke", base))
            .json(&json!({"id": "42"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["result"], "item 42");
    }

    #[tokio::test]
    async fn test_rest_invoke_base_url_override() {
        let (base, upstream, client) = start().await;

        let body: Value = client
            .post(format!("{}/tools/getItem/invoke", base))
            .json(&json!({"id": "1", "_apiBaseUrl": format!("{}/alt", upstream)}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["result"], "alt");
    }

    #[tokio::test]
    async fn test_rest_invoke_errors() {
        let (base, _, client) = start().await;

        let missing = client
            .post(format!("{}/tools/nope/invoke", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let unresolved = client
            .post(format!("{}/tools/getItem/invoke", base))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(unresolved.status(), StatusCode::BAD_REQUEST);

        let not_object = client
            .post(format!("{}/tools/getItem/invoke", base))
            .body("[1]")
            .send()
            .await
            .unwrap();
        assert_eq!(not_object.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_with_skip_discovery_empties_catalog() {
        let (base, _, client) = start().await;

        let response: Value = client
            .post(format!("{}/tools/refresh", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(response["tools"], 0);

        let health: Value = client
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["tools"], 0);
    }

    async fn rpc(base: &str, client: &reqwest::Client, body: Value) -> Value {
        client
            .post(format!("{}/mcp", base))
            .json(&body)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_rpc_tools() {
        let (base, _, client) = start().await;

        let init = rpc(&base, &client, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);

        let list = rpc(&base, &client, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        assert_eq!(list["result"]["tools"][0]["name"], "getItem");
        assert_eq!(list["result"]["tools"][0]["inputSchema"]["required"], json!(["id"]));

        let call = rpc(
            &base,
            &client,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "getItem", "arguments": {"id": "7"}}}),
        )
        .await;
        assert_eq!(call["result"]["content"][0]["text"], "item 7");

        let failed = rpc(
            &base,
            &client,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "getItem", "arguments": {}}}),
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);

        let unknown = rpc(
            &base,
            &client,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await;
        assert_eq!(unknown["error"]["code"], -32602);

        let bad = rpc(&base, &client, json!({"jsonrpc": "2.0", "id": 6, "method": "bogus"})).await;
        assert_eq!(bad["error"]["code"], -32601);
    }
}
