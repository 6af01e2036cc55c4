//! Retrieval of description documents.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use super::error::DiscoveryError;

/// Source of raw description text.
#[async_trait]
pub trait DescriptionFetcher: Send + Sync {
    /// Fetch the document behind `locator` as text.
    async fn fetch(&self, locator: &str) -> Result<String, DiscoveryError>;
}

/// Fetches descriptions with an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::fetch("<client>", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DescriptionFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<String, DiscoveryError> {
        let url = Url::parse(locator).map_err(|e| DiscoveryError::fetch(locator, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DiscoveryError::fetch(
                locator,
                format!("unsupported scheme '{}', only http and https are supported", url.scheme()),
            ));
        }

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json, application/yaml;q=0.9, */*;q=0.8")
            .send()
            .await
            .map_err(|e| DiscoveryError::fetch(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::fetch(locator, format!("HTTP {}", status)));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            debug!("Description content type: {}", content_type);
            if is_binary_content_type(content_type) {
                return Err(DiscoveryError::fetch(
                    locator,
                    format!("non-text content type '{}'", content_type),
                ));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DiscoveryError::fetch(locator, e))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DiscoveryError::fetch(locator, "response is not UTF-8 text"))
    }
}

fn is_binary_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ["image/", "audio/", "video/", "font/"]
        .iter()
        .any(|prefix| media_type.starts_with(prefix))
        || matches!(
            media_type.as_str(),
            "application/pdf" | "application/zip" | "application/gzip" | "application/x-protobuf"
        )
}
