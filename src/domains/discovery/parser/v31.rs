//! OpenAPI 3.1 backend.

use serde::Deserialize;
use serde_json::Value;

use super::{Backend, ParameterEntry, ParsedDocument, first_server_url, require_info, resolve, walk_paths};
use crate::domains::discovery::error::DiscoveryError;

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    description: Option<String>,
}

/// 3.1 schemas may declare a list of types, e.g. `["integer", "null"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeSet {
    Single(String),
    Many(Vec<String>),
}

impl TypeSet {
    fn primary(self) -> Option<String> {
        match self {
            Self::Single(t) => Some(t),
            Self::Many(types) => types.into_iter().find(|t| t != "null"),
        }
    }
}

pub(super) fn parse(root: &Value) -> Result<ParsedDocument, DiscoveryError> {
    let version = root
        .get("openapi")
        .and_then(Value::as_str)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| DiscoveryError::parse("missing 'openapi' version field"))?;
    let title = require_info(root)?;

    let has_paths = root.get("paths").is_some();
    if !has_paths && root.get("components").is_none() && root.get("webhooks").is_none() {
        return Err(DiscoveryError::parse(
            "document must declare at least one of 'paths', 'components' or 'webhooks'",
        ));
    }

    let paths = match root.get("paths") {
        Some(Value::Object(paths)) => walk_paths(root, paths, read_parameter),
        Some(_) => return Err(DiscoveryError::parse("'paths' must be an object")),
        None => Vec::new(),
    };

    Ok(ParsedDocument {
        version,
        backend: Backend::V31,
        title,
        server_url: first_server_url(root),
        paths,
    })
}

fn read_parameter(root: &Value, raw: &Value) -> Result<ParameterEntry, String> {
    let param = RawParameter::deserialize(raw).map_err(|e| e.to_string())?;

    let schema_type = raw
        .get("schema")
        .and_then(|schema| resolve(root, schema))
        .and_then(|schema| schema.get("type"))
        .and_then(|t| TypeSet::deserialize(t).ok())
        .and_then(TypeSet::primary);

    Ok(ParameterEntry {
        name: param.name,
        location: param.location,
        required: param.required,
        schema_type,
        description: param.description,
    })
}
