//! Tool Registry - the published catalog and dispatch for all tools.
//!
//! This module provides:
//! - The currently published catalog, replaced atomically on refresh
//! - Protocol tool metadata for listing
//! - Dispatch of tool calls to the invocation engine

use rmcp::model::Tool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::catalog::Catalog;
use super::error::ToolError;
use super::invoker::InvocationEngine;
use super::model::{Arguments, ToolDefinition};
use super::schema::schema_for;
use crate::core::config::Config;
use crate::domains::discovery::DiscoveryService;

/// Tool registry - owns the published catalog.
///
/// Readers take a snapshot (`Arc<Catalog>`) and never observe a catalog that
/// is still being built. A refresh builds the next catalog off to the side
/// and swaps it in only when discovery succeeded.
pub struct ToolRegistry {
    config: Arc<Config>,
    discovery: DiscoveryService,
    engine: InvocationEngine,
    catalog: RwLock<Arc<Catalog>>,
}

impl ToolRegistry {
    /// Create a registry with an empty catalog and HTTP discovery.
    pub fn new(config: Arc<Config>) -> crate::core::Result<Self> {
        let discovery =
            DiscoveryService::http(Duration::from_millis(config.api.request_timeout_ms))?;
        Self::with_discovery(config, discovery)
    }

    /// Create a registry with a custom discovery service.
    pub fn with_discovery(
        config: Arc<Config>,
        discovery: DiscoveryService,
    ) -> crate::core::Result<Self> {
        let engine = InvocationEngine::new(&config.api, &config.auth)?;
        Ok(Self {
            config,
            discovery,
            engine,
            catalog: RwLock::new(Arc::new(Catalog::new())),
        })
    }

    /// Run a discovery pass and publish its catalog.
    ///
    /// On failure the previously published catalog stays in place.
    /// Returns the number of tools now published.
    pub async fn refresh(&self) -> crate::core::Result<usize> {
        if self.config.api.skip_discovery {
            info!("Discovery skipped by configuration, publishing an empty catalog");
            self.publish(Catalog::new()).await;
            return Ok(0);
        }

        let locator = self.config.api.swagger_url.as_deref().ok_or_else(|| {
            crate::core::Error::config("no API description locator configured")
        })?;

        match self.discovery.discover(locator).await {
            Ok(catalog) => {
                let count = catalog.len();
                self.publish(catalog).await;
                Ok(count)
            }
            Err(e) => {
                warn!("Discovery failed, keeping the current catalog: {}", e);
                Err(e.into())
            }
        }
    }

    /// Replace the published catalog.
    pub async fn publish(&self, catalog: Catalog) {
        let count = catalog.len();
        *self.catalog.write().await = Arc::new(catalog);
        info!("Published catalog with {} tools", count);
    }

    /// Snapshot of the published catalog.
    pub async fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().await.clone()
    }

    /// All published tools as protocol Tool models (metadata).
    pub async fn list_tools(&self) -> Vec<Tool> {
        self.catalog().await.tools().map(to_tool).collect()
    }

    /// Invoke a tool by id.
    ///
    /// Base URL precedence: `base_url_override`, the configured API base URL,
    /// the server URL declared by the description, the description locator.
    pub async fn call_tool(
        &self,
        id: &str,
        args: &Arguments,
        base_url_override: Option<&str>,
    ) -> Result<String, ToolError> {
        let catalog = self.catalog().await;
        let Some(tool) = catalog.get(id) else {
            warn!("Unknown tool requested: {}", id);
            return Err(ToolError::not_found(id));
        };

        let base_url = base_url_override.or_else(|| {
            self.config
                .api
                .base_url
                .is_none()
                .then(|| catalog.server_url())
                .flatten()
        });

        self.engine.invoke(tool, args, base_url).await
    }
}

/// Protocol tool model for a definition.
pub fn to_tool(tool: &ToolDefinition) -> Tool {
    Tool {
        name: tool.id.clone().into(),
        description: Some(tool.summary.clone().into()),
        input_schema: Arc::new(schema_for(tool)),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::discovery::{DescriptionFetcher, DiscoveryError, discover_text};
    use crate::domains::tools::model::ArgValue;
    use async_trait::async_trait;
    use axum::{Router, routing::get};
    use std::sync::Mutex;

    const LOCATOR: &str = "http://docs.test/swagger.json";

    /// Serves whatever document is currently loaded, or fails.
    struct SwappableFetcher(Mutex<Option<String>>);

    #[async_trait]
    impl DescriptionFetcher for SwappableFetcher {
        async fn fetch(&self, locator: &str) -> Result<String, DiscoveryError> {
            self.0
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DiscoveryError::fetch(locator, "HTTP 503 Service Unavailable"))
        }
    }

    fn document(ids: &[&str]) -> String {
        let paths: serde_json::Map<String, serde_json::Value> = ids
            .iter()
            .map(|id| {
                (
                    format!("/{}", id),
                    serde_json::json!({"get": {"operationId": id, "summary": format!("Run {}", id)}}),
                )
            })
            .collect();
        serde_json::json!({"swagger": "2.0", "info": {"title": "t"}, "paths": paths}).to_string()
    }

    fn config(base_url: Option<&str>) -> Arc<Config> {
        let mut config = Config::default();
        config.api.swagger_url = Some(LOCATOR.to_string());
        config.api.base_url = base_url.map(str::to_string);
        Arc::new(config)
    }

    fn build_registry(fetcher: Arc<SwappableFetcher>, config: Arc<Config>) -> ToolRegistry {
        ToolRegistry::with_discovery(config, DiscoveryService::new(fetcher)).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_publishes_catalog() {
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(Some(document(&["listItems", "getItem"])))));
        let registry = build_registry(fetcher, config(None));

        assert!(registry.list_tools().await.is_empty());
        assert_eq!(registry.refresh().await.unwrap(), 2);

        let tools = registry.list_tools().await;
        let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, vec!["listItems", "getItem"]);
        assert_eq!(tools[0].description.as_deref(), Some("Run listItems"));
        assert_eq!(tools[0].input_schema["additionalProperties"], false);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_catalog() {
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(Some(document(&["listItems"])))));
        let registry = build_registry(fetcher.clone(), config(None));
        registry.refresh().await.unwrap();
        let before = registry.catalog().await;

        *fetcher.0.lock().unwrap() = None;
        assert!(registry.refresh().await.is_err());
        assert_eq!(*registry.catalog().await, *before);

        *fetcher.0.lock().unwrap() = Some("{\"swagger\": \"2.0\"}".to_string());
        assert!(registry.refresh().await.is_err());
        assert_eq!(registry.catalog().await.ids().collect::<Vec<_>>(), vec!["listItems"]);
    }

    #[tokio::test]
    async fn test_snapshot_survives_refresh() {
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(Some(document(&["a"])))));
        let registry = build_registry(fetcher.clone(), config(None));
        registry.refresh().await.unwrap();

        let snapshot = registry.catalog().await;
        *fetcher.0.lock().unwrap() = Some(document(&["b", "c"]));
        registry.refresh().await.unwrap();

        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(registry.catalog().await.len(), 2);
    }

    #[tokio::test]
    async fn test_skip_discovery_publishes_empty_catalog() {
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(None)));
        let mut config = Config::default();
        config.api.skip_discovery = true;
        let registry = build_registry(fetcher, Arc::new(config));

        assert_eq!(registry.refresh().await.unwrap(), 0);
        assert!(registry.catalog().await.is_empty());
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(None)));
        let registry = build_registry(fetcher, config(None));
        let err = registry
            .call_tool("nope", &Arguments::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(id) if id == "nope"));
    }

    async fn spawn_api() -> String {
        let app = Router::new()
            .route("/v1/items", get(|| async { "from-v1" }))
            .route("/v2/items", get(|| async { "from-v2" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn catalog_with_server(server: &str) -> Catalog {
        let text = serde_json::json!({
            "openapi": "3.0.0",
            "info": {"title": "t"},
            "servers": [{"url": format!("{}/v1", server)}],
            "paths": {"/items": {"get": {"operationId": "listItems"}}}
        })
        .to_string();
        discover_text(&text, Some(LOCATOR)).unwrap()
    }

    #[tokio::test]
    async fn test_base_url_precedence() {
        let server = spawn_api().await;
        let fetcher = Arc::new(SwappableFetcher(Mutex::new(None)));
        let args = Arguments::from([("unused".to_string(), ArgValue::Null)]);

        // Declared server URL applies without configuration.
        let registry = build_registry(fetcher.clone(), config(None));
        registry.publish(catalog_with_server(&server)).await;
        assert_eq!(registry.call_tool("listItems", &args, None).await.unwrap(), "from-v1");

        // A per-call override wins.
        let v2 = format!("{}/v2", server);
        assert_eq!(
            registry.call_tool("listItems", &args, Some(&v2)).await.unwrap(),
            "from-v2"
        );

        // A configured base URL beats the declared server URL.
        let registry = build_registry(fetcher, config(Some(&v2)));
        registry.publish(catalog_with_server(&server)).await;
        assert_eq!(registry.call_tool("listItems", &args, None).await.unwrap(), "from-v2");
    }
}
