//! Normalized tool model.
//!
//! One [`ToolDefinition`] is produced per API operation found in a
//! description document. Definitions are immutable once built and are shared
//! read-only with the invocation engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the synthetic parameter carrying a request body.
pub const BODY_PARAM: &str = "body";

/// HTTP verb of an operation.
///
/// Every verb a description document can declare is representable so the
/// catalog stays complete, but only GET, POST, PUT and DELETE are invocable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Parse the lowercase key used for operations inside a path item.
    pub fn from_operation_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "patch" => Some(Self::Patch),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an argument is placed in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    /// Map a description document's `in` value.
    ///
    /// Swagger 2.0 `formData` parameters travel in the body. Locations that
    /// have no place in the model (e.g. `cookie`) yield `None`.
    pub fn from_declared(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "body" | "formdata" => Some(Self::Body),
            _ => None,
        }
    }
}

/// Coarse semantic type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Map a declared primitive type; unknown or absent types become `String`.
    pub fn from_declared(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("integer" | "int" | "long") => Self::Integer,
            Some("number" | "float" | "double") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("object") => Self::Object,
            Some("array") => Self::Array,
            _ => Self::String,
        }
    }

    /// JSON Schema type keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDescriptor {
    /// The synthetic descriptor appended when an operation declares a body.
    pub fn request_body() -> Self {
        Self {
            name: BODY_PARAM.to_string(),
            location: ParamLocation::Body,
            required: true,
            param_type: ParamType::Object,
            description: Some("Request body".to_string()),
        }
    }
}

/// One API operation exposed as a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub id: String,
    pub summary: String,
    pub path: String,
    pub http_method: HttpMethod,
    pub parameters: Vec<ParameterDescriptor>,
}

impl ToolDefinition {
    /// True iff exactly one parameter is located in the body.
    pub fn has_request_body(&self) -> bool {
        self.parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
            .count()
            == 1
    }

    /// Parameters at the given location, in declaration order.
    pub fn parameters_in(
        &self,
        location: ParamLocation,
    ) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}

/// A single argument value supplied by a caller.
///
/// Arguments arrive as loosely typed JSON; this closed set of shapes keeps the
/// path, query and header serialization rules exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ArgValue>),
    Map(IndexMap<String, ArgValue>),
}

/// The argument map of one invocation.
pub type Arguments = HashMap<String, ArgValue>;

impl ArgValue {
    /// Textual form used for path segments and headers.
    ///
    /// Lists are comma-joined, maps become compact JSON, null has no form.
    pub fn to_param_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::List(items) => Some(
                items
                    .iter()
                    .filter_map(ArgValue::to_param_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Self::Map(_) => Some(serde_json::Value::from(self.clone()).to_string()),
        }
    }

    /// Values contributed to a query string: one per list item.
    pub fn to_query_values(&self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .iter()
                .filter_map(ArgValue::to_param_string)
                .collect(),
            other => other.to_param_string().into_iter().collect(),
        }
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<ArgValue> for serde_json::Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Null => Self::Null,
            ArgValue::Bool(b) => Self::Bool(b),
            ArgValue::Number(n) => Self::Number(n),
            ArgValue::String(s) => Self::String(s),
            ArgValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            ArgValue::Map(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Convert a protocol argument object into an argument map.
pub fn arguments_from_json(object: serde_json::Map<String, serde_json::Value>) -> Arguments {
    object
        .into_iter()
        .map(|(name, value)| (name, ArgValue::from(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param(name: &str, location: ParamLocation) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            location,
            required: false,
            param_type: ParamType::String,
            description: None,
        }
    }

    fn tool(parameters: Vec<ParameterDescriptor>) -> ToolDefinition {
        ToolDefinition {
            id: "t".to_string(),
            summary: "t".to_string(),
            path: "/t".to_string(),
            http_method: HttpMethod::Post,
            parameters,
        }
    }

    #[test]
    fn test_has_request_body() {
        assert!(!tool(vec![param("q", ParamLocation::Query)]).has_request_body());
        assert!(tool(vec![
            param("q", ParamLocation::Query),
            ParameterDescriptor::request_body()
        ])
        .has_request_body());
    }

    #[test]
    fn test_param_type_defaults_to_string() {
        assert_eq!(ParamType::from_declared(None), ParamType::String);
        assert_eq!(ParamType::from_declared(Some("file")), ParamType::String);
        assert_eq!(ParamType::from_declared(Some("integer")), ParamType::Integer);
        assert_eq!(ParamType::from_declared(Some("double")), ParamType::Number);
    }

    #[test]
    fn test_location_mapping() {
        assert_eq!(ParamLocation::from_declared("query"), Some(ParamLocation::Query));
        assert_eq!(ParamLocation::from_declared("formData"), Some(ParamLocation::Body));
        assert_eq!(ParamLocation::from_declared("cookie"), None);
    }

    #[test]
    fn test_arg_value_string_forms() {
        assert_eq!(ArgValue::from(json!(7)).to_param_string().as_deref(), Some("7"));
        assert_eq!(ArgValue::from(json!(2.5)).to_param_string().as_deref(), Some("2.5"));
        assert_eq!(ArgValue::from(json!(true)).to_param_string().as_deref(), Some("true"));
        assert_eq!(ArgValue::from(json!(["a", 1])).to_param_string().as_deref(), Some("a,1"));
        assert_eq!(
            ArgValue::from(json!({"k": "v"})).to_param_string().as_deref(),
            Some(r#"{"k":"v"}"#)
        );
        assert_eq!(ArgValue::Null.to_param_string(), None);
    }

    #[test]
    fn test_query_values_expand_lists() {
        let value = ArgValue::from(json!(["red", "blue"]));
        assert_eq!(value.to_query_values(), vec!["red", "blue"]);
        assert!(ArgValue::Null.to_query_values().is_empty());
    }

    #[test]
    fn test_arg_value_json_conversion_preserves_shape() {
        let original = json!({"name": "rex", "tags": ["a"], "age": 3, "vaccinated": null});
        let back: serde_json::Value = ArgValue::from(original.clone()).into();
        assert_eq!(back, original);
    }

    #[test]
    fn test_tool_definition_serializes_camel_case() {
        let value = serde_json::to_value(tool(vec![param("q", ParamLocation::Query)])).unwrap();
        assert_eq!(value["httpMethod"], "POST");
        assert_eq!(value["parameters"][0]["location"], "query");
        assert_eq!(value["parameters"][0]["type"], "string");
    }
}
