//! Description document parsing.
//!
//! Two backends share one output shape. The backend is chosen from the
//! document's version field: OpenAPI 3.1 documents go to [`Backend::V31`],
//! everything else (Swagger 2.0, OpenAPI 3.0) to [`Backend::LegacyOrV3`].
//! The chosen backend's verdict is final.

mod legacy;
mod v31;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::DiscoveryError;
use crate::domains::tools::model::HttpMethod;

const MAX_REF_DEPTH: usize = 16;

/// Parser backend for a version family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Swagger 2.0 and OpenAPI 3.0.
    LegacyOrV3,
    /// OpenAPI 3.1.
    V31,
}

impl Backend {
    /// Pick the backend for a loaded document tree.
    pub fn detect(root: &Value) -> Self {
        match root.get("openapi").and_then(Value::as_str) {
            Some(version) if is_v31(version) => Self::V31,
            _ => Self::LegacyOrV3,
        }
    }

    pub fn parse(self, root: &Value) -> Result<ParsedDocument, DiscoveryError> {
        match self {
            Self::LegacyOrV3 => legacy::parse(root),
            Self::V31 => v31::parse(root),
        }
    }
}

fn is_v31(version: &str) -> bool {
    let version = version.trim();
    version == "3.1" || version.starts_with("3.1.")
}

/// Intermediate document produced by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub version: String,
    pub backend: Backend,
    pub title: Option<String>,
    /// Server URL as declared; may be relative or scheme-relative.
    pub server_url: Option<String>,
    pub paths: Vec<PathEntry>,
}

/// One path template and its operations, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub template: String,
    pub operations: Vec<OperationEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationEntry {
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Path-level and operation-level parameters, merged.
    pub parameters: Vec<ParameterEntry>,
    pub has_request_body: bool,
}

/// A parameter as declared, before mapping onto the tool model.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub name: String,
    pub location: String,
    pub required: bool,
    pub schema_type: Option<String>,
    pub description: Option<String>,
}

impl ParameterEntry {
    fn is_body(&self) -> bool {
        matches!(self.location.as_str(), "body" | "formData")
    }
}

/// Backend-specific reading of one resolved parameter object.
pub(crate) type ReadParameter = fn(&Value, &Value) -> Result<ParameterEntry, String>;

/// Parse description text into a document.
pub fn parse_document(text: &str) -> Result<ParsedDocument, DiscoveryError> {
    let root = load_tree(text)?;
    let backend = Backend::detect(&root);
    debug!("Selected {:?} parser backend", backend);
    backend.parse(&root)
}

/// Load JSON or YAML text into a JSON tree, keeping key order.
pub fn load_tree(text: &str) -> Result<Value, DiscoveryError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(DiscoveryError::parse("document is empty"));
    }

    let mut root = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json_err) => {
            let yaml = serde_yaml::from_str::<serde_yaml::Value>(text).map_err(|yaml_err| {
                DiscoveryError::parse(format!(
                    "document is neither JSON ({}) nor YAML ({})",
                    json_err, yaml_err
                ))
            })?;
            yaml_to_json(yaml)
        }
    };

    let Some(fields) = root.as_object_mut() else {
        return Err(DiscoveryError::parse("document root is not an object"));
    };
    normalize_version_fields(fields);
    Ok(root)
}

// Unquoted `swagger: 2.0` or `openapi: 3.1` loads as a number.
fn normalize_version_fields(fields: &mut Map<String, Value>) {
    for key in ["swagger", "openapi"] {
        if let Some(Value::Number(number)) = fields.get(key) {
            let version = number.to_string();
            fields.insert(key.to_string(), Value::String(version));
        }
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

// Response codes and similar keys are often unquoted numbers in YAML.
fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;
    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Follow local `$ref` pointers until a non-reference node is reached.
///
/// Returns `None` for remote references, dangling pointers and cycles.
pub(crate) fn resolve<'a>(root: &'a Value, node: &'a Value) -> Option<&'a Value> {
    let mut current = node;
    for _ in 0..MAX_REF_DEPTH {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return Some(current);
        };
        let pointer = reference.strip_prefix('#')?;
        current = root.pointer(pointer)?;
    }
    None
}

/// Require the `info` object every version family mandates.
pub(crate) fn require_info(root: &Value) -> Result<Option<String>, DiscoveryError> {
    let info = root
        .get("info")
        .and_then(Value::as_object)
        .ok_or_else(|| DiscoveryError::parse("missing required 'info' object"))?;
    Ok(info.get("title").and_then(Value::as_str).map(str::to_string))
}

/// First entry of a 3.x `servers` list, with variables replaced by defaults.
pub(crate) fn first_server_url(root: &Value) -> Option<String> {
    let server = root.get("servers")?.as_array()?.first()?;
    let mut url = server.get("url")?.as_str()?.to_string();
    if let Some(variables) = server.get("variables").and_then(Value::as_object) {
        for (name, variable) in variables {
            if let Some(default) = variable.get("default").and_then(Value::as_str) {
                url = url.replace(&format!("{{{}}}", name), default);
            }
        }
    }
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationFields {
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

/// Walk a `paths` object in document order.
pub(crate) fn walk_paths(
    root: &Value,
    paths: &Map<String, Value>,
    read_parameter: ReadParameter,
) -> Vec<PathEntry> {
    let mut entries = Vec::with_capacity(paths.len());

    for (template, item) in paths {
        let Some(item) = resolve(root, item).and_then(Value::as_object) else {
            warn!("Skipping path '{}': path item is not an object", template);
            continue;
        };

        let shared = read_parameters(root, item.get("parameters"), read_parameter, template);
        let mut operations = Vec::new();

        for (key, operation) in item {
            let Some(method) = HttpMethod::from_operation_key(key) else {
                continue;
            };
            let Some(operation_map) = operation.as_object() else {
                warn!("Skipping {} {}: operation is not an object", method, template);
                continue;
            };

            let fields = OperationFields::deserialize(operation).unwrap_or_else(|e| {
                warn!("Ignoring malformed fields of {} {}: {}", method, template, e);
                OperationFields::default()
            });

            let own = read_parameters(
                root,
                operation_map.get("parameters"),
                read_parameter,
                template,
            );
            let parameters = merge_parameters(shared.clone(), own);
            let has_request_body = operation_map.contains_key("requestBody")
                || parameters.iter().any(ParameterEntry::is_body);

            operations.push(OperationEntry {
                method,
                operation_id: fields.operation_id,
                summary: fields.summary,
                description: fields.description,
                parameters,
                has_request_body,
            });
        }

        entries.push(PathEntry {
            template: template.clone(),
            operations,
        });
    }

    entries
}

fn read_parameters(
    root: &Value,
    list: Option<&Value>,
    read_parameter: ReadParameter,
    template: &str,
) -> Vec<ParameterEntry> {
    let Some(list) = list.and_then(Value::as_array) else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|raw| {
            let Some(resolved) = resolve(root, raw) else {
                warn!("Skipping unresolvable parameter reference under '{}'", template);
                return None;
            };
            read_parameter(root, resolved)
                .map_err(|e| warn!("Skipping malformed parameter under '{}': {}", template, e))
                .ok()
        })
        .collect()
}

// Operation-level parameters replace path-level ones with the same name and location.
fn merge_parameters(
    mut merged: Vec<ParameterEntry>,
    own: Vec<ParameterEntry>,
) -> Vec<ParameterEntry> {
    for param in own {
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    merged
}
