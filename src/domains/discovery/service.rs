//! Discovery pipeline: fetch, parse, build.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::builder::build_catalog;
use super::error::DiscoveryError;
use super::fetch::{DescriptionFetcher, HttpFetcher};
use super::parser::parse_document;
use crate::domains::tools::catalog::Catalog;

/// Produces catalogs from description locators.
#[derive(Clone)]
pub struct DiscoveryService {
    fetcher: Arc<dyn DescriptionFetcher>,
}

impl DiscoveryService {
    pub fn new(fetcher: Arc<dyn DescriptionFetcher>) -> Self {
        Self { fetcher }
    }

    /// Service fetching over HTTP with the given timeout.
    pub fn http(timeout: Duration) -> Result<Self, DiscoveryError> {
        Ok(Self::new(Arc::new(HttpFetcher::new(timeout)?)))
    }

    /// Fetch, parse and catalog the description behind `locator`.
    pub async fn discover(&self, locator: &str) -> Result<Catalog, DiscoveryError> {
        info!("Loading API description from {}", locator);
        let text = self.fetcher.fetch(locator).await?;
        debug!("Fetched {} bytes of description text", text.len());
        discover_text(&text, Some(locator))
    }
}

impl std::fmt::Debug for DiscoveryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryService").finish_non_exhaustive()
    }
}

/// Parse and catalog description text that is already in memory.
pub fn discover_text(text: &str, locator: Option<&str>) -> Result<Catalog, DiscoveryError> {
    let document = parse_document(text)?;
    Ok(build_catalog(&document, locator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticFetcher(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl DescriptionFetcher for StaticFetcher {
        async fn fetch(&self, locator: &str) -> Result<String, DiscoveryError> {
            self.0
                .get(locator)
                .map(|text| text.to_string())
                .ok_or_else(|| DiscoveryError::fetch(locator, "HTTP 404 Not Found"))
        }
    }

    fn service() -> DiscoveryService {
        let mut documents = HashMap::new();
        documents.insert(
            "http://api.test/swagger.json",
            r#"{"openapi": "3.1.0", "info": {"title": "t"}, "paths": {"/items": {"get": {"operationId": "listItems"}}}}"#,
        );
        documents.insert("http://api.test/broken.json", "not a description");
        DiscoveryService::new(Arc::new(StaticFetcher(documents)))
    }

    #[tokio::test]
    async fn test_discover() {
        let catalog = service().discover("http://api.test/swagger.json").await.unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["listItems"]);
        assert_eq!(catalog.spec_version(), Some("3.1.0"));
    }

    #[tokio::test]
    async fn test_discover_fetch_failure() {
        let err = service().discover("http://api.test/missing.json").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_discover_parse_failure() {
        let err = service().discover("http://api.test/broken.json").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Parse(_)));
    }
}
