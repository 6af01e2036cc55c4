//! Tool catalog construction.
//!
//! Turns a [`ParsedDocument`] into a [`Catalog`]: one tool per operation,
//! ids taken from `operationId` or synthesized from method and path.

use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::parser::{OperationEntry, ParsedDocument};
use crate::domains::tools::catalog::Catalog;
use crate::domains::tools::model::{
    BODY_PARAM, HttpMethod, ParamLocation, ParamType, ParameterDescriptor, ToolDefinition,
};

static PATH_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("valid placeholder pattern"));

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid non-word pattern"));

/// Build the catalog for a parsed document.
///
/// `locator` is where the document was loaded from; relative server URLs
/// declared by the document are resolved against it.
pub fn build_catalog(document: &ParsedDocument, locator: Option<&str>) -> Catalog {
    let server_url = document
        .server_url
        .as_deref()
        .and_then(|url| resolve_server_url(url, locator));

    let mut catalog = Catalog::new()
        .with_spec_version(document.version.clone())
        .with_server_url(server_url);

    if document.paths.is_empty() {
        warn!("API description declares no paths");
    }

    for path in &document.paths {
        for operation in &path.operations {
            let tool = build_tool(&path.template, operation);
            debug!(
                "Registered tool '{}' for {} {}",
                tool.id, tool.http_method, tool.path
            );
            catalog.insert(tool);
        }
    }

    info!(
        "Loaded {} tools from {} description{}",
        catalog.len(),
        document.version,
        document
            .title
            .as_deref()
            .map(|t| format!(" '{}'", t))
            .unwrap_or_default()
    );
    catalog
}

/// Synthesize an id for an operation without `operationId`.
///
/// `GET /pets/{petId}` becomes `get_pets_by_petId`.
pub fn synthesize_id(method: HttpMethod, template: &str) -> String {
    let named = PATH_PLACEHOLDER.replace_all(template, "by_$1");
    let normalized = NON_WORD.replace_all(&named, "_");
    format!("{}{}", method.as_str().to_ascii_lowercase(), normalized)
}

fn build_tool(template: &str, operation: &OperationEntry) -> ToolDefinition {
    let id = operation
        .operation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| synthesize_id(operation.method, template));

    let mut parameters: Vec<ParameterDescriptor> = Vec::with_capacity(operation.parameters.len() + 1);
    for raw in &operation.parameters {
        let Some(location) = ParamLocation::from_declared(&raw.location) else {
            debug!(
                "Skipping parameter '{}' of '{}' in unsupported location '{}'",
                raw.name, id, raw.location
            );
            continue;
        };
        if location == ParamLocation::Body {
            continue;
        }
        if operation.has_request_body && raw.name == BODY_PARAM {
            warn!(
                "Parameter '{}' of '{}' clashes with the request body and is skipped",
                raw.name, id
            );
            continue;
        }
        if parameters.iter().any(|p| p.name == raw.name) {
            warn!(
                "Duplicate parameter name '{}' in '{}', keeping the first",
                raw.name, id
            );
            continue;
        }

        parameters.push(ParameterDescriptor {
            name: raw.name.clone(),
            location,
            required: raw.required,
            param_type: ParamType::from_declared(raw.schema_type.as_deref()),
            description: raw.description.clone().filter(|d| !d.trim().is_empty()),
        });
    }

    if operation.has_request_body {
        parameters.push(ParameterDescriptor::request_body());
    }

    let summary = [&operation.summary, &operation.description]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());

    ToolDefinition {
        id,
        summary,
        path: template.to_string(),
        http_method: operation.method,
        parameters,
    }
}

fn resolve_server_url(declared: &str, locator: Option<&str>) -> Option<String> {
    if let Ok(url) = Url::parse(declared) {
        return Some(url.to_string());
    }

    let resolved = locator
        .and_then(|locator| Url::parse(locator).ok())
        .and_then(|base| base.join(declared).ok());
    if resolved.is_none() {
        warn!(
            "Ignoring relative server URL '{}' without an absolute document location",
            declared
        );
    }
    resolved.map(String::from)
}
