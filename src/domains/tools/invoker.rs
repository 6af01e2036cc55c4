//! Invocation engine.
//!
//! Executes one tool definition against a live API: resolves the path
//! template, assembles the URL and query string, attaches headers and body,
//! dispatches by verb and classifies the response.
//!
//! The engine owns no per-call state. The shared `reqwest::Client` is safe
//! for concurrent use and the caller's argument map is only borrowed.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::{Captures, Regex};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::ToolError;
use super::model::{ArgValue, Arguments, BODY_PARAM, HttpMethod, ParamLocation, ToolDefinition};
use crate::core::config::{ApiConfig, AuthConfig};

/// Result returned for a successful DELETE, whatever the response body.
pub const DELETED_MARKER: &str = "Deleted";

/// Description-document filenames stripped from a base URL.
const DESCRIPTION_SUFFIXES: [&str; 2] = ["swagger.json", "swagger.yaml"];

/// Characters escaped inside a substituted path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern is valid"));

/// Executes tool definitions over HTTP.
#[derive(Debug, Clone)]
pub struct InvocationEngine {
    client: reqwest::Client,
    default_base_url: Option<String>,
    auth_header: Option<(HeaderName, HeaderValue)>,
    static_headers: Vec<(HeaderName, HeaderValue)>,
}

impl InvocationEngine {
    /// Create an engine from the API and auth configuration.
    ///
    /// The default base URL is the configured API base URL, else the
    /// description locator, minus a trailing description filename. Unusable
    /// static headers are skipped with a warning.
    pub fn new(api: &ApiConfig, auth: &AuthConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(api.request_timeout_ms))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::internal(format!("Failed to build HTTP client: {}", e)))?;

        let static_headers = api
            .headers
            .iter()
            .filter_map(|(name, value)| match header_pair(name, value) {
                Some(pair) => Some(pair),
                None => {
                    warn!("Ignoring invalid static header '{}'", name);
                    None
                }
            })
            .collect();

        Ok(Self {
            client,
            default_base_url: api
                .base_url
                .as_deref()
                .or(api.swagger_url.as_deref())
                .map(strip_description_suffix),
            auth_header: auth_header(auth),
            static_headers,
        })
    }

    /// Invoke a tool with the given arguments.
    ///
    /// `base_url_override` takes precedence over the configured default and
    /// is used as given. Exactly one request is sent; there are no retries.
    pub async fn invoke(
        &self,
        tool: &ToolDefinition,
        args: &Arguments,
        base_url_override: Option<&str>,
    ) -> Result<String, ToolError> {
        info!(
            "Invoking endpoint for tool id={}, path='{}', method={}",
            tool.id, tool.path, tool.http_method
        );

        let result = self.execute(tool, args, base_url_override).await;
        match &result {
            Ok(_) => info!("{} to {} successful", tool.http_method, tool.path),
            Err(e) => error!(
                "Error invoking endpoint toolId={}, path={}, method={}, params={:?}, error={}",
                tool.id,
                tool.path,
                tool.http_method,
                args.keys().collect::<Vec<_>>(),
                e
            ),
        }
        result
    }

    async fn execute(
        &self,
        tool: &ToolDefinition,
        args: &Arguments,
        base_url_override: Option<&str>,
    ) -> Result<String, ToolError> {
        let method = match tool.http_method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            other => return Err(ToolError::UnsupportedMethod(other)),
        };

        let base_url = base_url_override
            .or(self.default_base_url.as_deref())
            .ok_or(ToolError::MissingBaseUrl)?;
        let path = resolve_path(tool, args)?;
        let url = assemble_url(base_url, &path, &query_pairs(tool, args))?;
        let headers = self.build_headers(tool, args)?;
        debug!("Dispatching {} {}", method, url.path());

        let mut request = self.client.request(method, url).headers(headers);
        if matches!(tool.http_method, HttpMethod::Post | HttpMethod::Put) {
            if let Some(body) = args.get(BODY_PARAM) {
                request = request.json(body);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Error response from endpoint: status={}, body={}", status, body);
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        match tool.http_method {
            HttpMethod::Delete => Ok(DELETED_MARKER.to_string()),
            _ => Ok(response.text().await?),
        }
    }

    /// Headers for one request.
    ///
    /// Header-location arguments go first, then the auth header, then the
    /// static headers; a later entry replaces an earlier one with the same name.
    pub fn build_headers(
        &self,
        tool: &ToolDefinition,
        args: &Arguments,
    ) -> Result<HeaderMap, ToolError> {
        let mut headers = HeaderMap::new();

        for param in tool.parameters_in(ParamLocation::Header) {
            let Some(value) = args.get(&param.name).and_then(ArgValue::to_param_string) else {
                continue;
            };
            let (name, value) = header_pair(&param.name, &value).ok_or_else(|| {
                ToolError::invalid_arguments(format!(
                    "Header parameter '{}' is not a valid HTTP header",
                    param.name
                ))
            })?;
            headers.insert(name, value);
        }

        if let Some((name, value)) = &self.auth_header {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.static_headers {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }
}

fn header_pair(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
    let value = HeaderValue::from_str(value).ok()?;
    Some((name, value))
}

/// The configured auth header, present only when name, prefix and token are all set.
fn auth_header(auth: &AuthConfig) -> Option<(HeaderName, HeaderValue)> {
    let name = non_empty(&auth.header_name)?;
    let prefix = non_empty(&auth.header_prefix)?;
    let token = non_empty(&auth.token)?;

    match header_pair(name, &format!("{} {}", prefix, token)) {
        Some((name, mut value)) => {
            value.set_sensitive(true);
            Some((name, value))
        }
        None => {
            warn!("Ignoring invalid auth header configuration for '{}'", name);
            None
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Substitute `{name}` placeholders of the path template with argument values.
///
/// Values are percent-encoded as path segments. A placeholder without a
/// non-null argument is an error, and so is a dot segment (`.`, `..` or
/// their `%2e` spellings), which URL parsing would collapse into another
/// endpoint.
pub fn resolve_path(tool: &ToolDefinition, args: &Arguments) -> Result<String, ToolError> {
    let mut unresolved: Option<String> = None;
    let mut dot_segment: Option<String> = None;

    let resolved = PLACEHOLDER.replace_all(&tool.path, |caps: &Captures| {
        let name = &caps[1];
        match args.get(name).and_then(ArgValue::to_param_string) {
            Some(value) if is_dot_segment(&value) => {
                dot_segment.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
            Some(value) => utf8_percent_encode(&value, PATH_SEGMENT).to_string(),
            None => {
                unresolved.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
        }
    });

    if let Some(name) = unresolved {
        return Err(ToolError::UnresolvedPathParameter {
            name,
            path: tool.path.clone(),
        });
    }
    if let Some(name) = dot_segment {
        return Err(ToolError::invalid_arguments(format!(
            "path parameter '{}' must not be a dot segment",
            name
        )));
    }
    Ok(resolved.into_owned())
}

fn is_dot_segment(value: &str) -> bool {
    let decoded = percent_decode_str(value.trim()).decode_utf8_lossy();
    matches!(decoded.as_ref(), "." | "..")
}

/// Query pairs in declared parameter order; list values repeat the key.
pub fn query_pairs(tool: &ToolDefinition, args: &Arguments) -> Vec<(String, String)> {
    tool.parameters_in(ParamLocation::Query)
        .filter_map(|param| args.get(&param.name).map(|value| (param, value)))
        .flat_map(|(param, value)| {
            value
                .to_query_values()
                .into_iter()
                .map(move |v| (param.name.clone(), v))
        })
        .collect()
}

/// Drop a trailing `swagger.json`/`swagger.yaml` segment from a base URL.
///
/// The query and fragment of such a locator are dropped with it. Anything
/// else is returned unchanged.
pub fn strip_description_suffix(base_url: &str) -> String {
    let Ok(mut url) = Url::parse(base_url) else {
        return base_url.to_string();
    };

    let is_description = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|last| DESCRIPTION_SUFFIXES.contains(&last));
    if !is_description {
        return base_url.to_string();
    }

    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop();
    }
    url.set_query(None);
    url.set_fragment(None);
    url.as_str().trim_end_matches('/').to_string()
}

/// Join base URL, resolved path and query pairs into the request URL.
pub fn assemble_url(
    base_url: &str,
    resolved_path: &str,
    query: &[(String, String)],
) -> Result<Url, ToolError> {
    let mut url = base_url.trim_end_matches('/').to_string();
    if !resolved_path.starts_with('/') {
        url.push('/');
    }
    url.push_str(resolved_path);

    if !query.is_empty() {
        let encoded = serde_urlencoded::to_string(query)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
    }

    Url::parse(&url).map_err(|e| ToolError::InvalidUrl(format!("{} ({})", e, base_url)))
}
