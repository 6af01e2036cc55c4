//! Swagger 2.0 and OpenAPI 3.0 backend.

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
    /// Swagger 2.0 non-body parameters carry their type inline.
    #[serde(rename = "type")]
    inline_type: Option<String>,
}

pub(super) fn parse(root: &Value) -> Result<ParsedDocument, DiscoveryError> {
    let version = declared_version(root)?;
    let title = require_info(root)?;
    let swagger2 = version.starts_with('2');

    let paths = match root.get("paths") {
        Some(Value::Object(paths)) => walk_paths(root, paths, read_parameter),
        Some(_) => return Err(DiscoveryError::parse("'paths' must be an object")),
        None => return Err(DiscoveryError::parse("missing required 'paths' object")),
    };

    let server_url = if swagger2 {
        swagger2_server_url(root)
    } else {
        first_server_url(root)
    };

    Ok(ParsedDocument {
        version,
        backend: Backend::LegacyOrV3,
        title,
        server_url,
        paths,
    })
}

fn declared_version(root: &Value) -> Result<String, DiscoveryError> {
    if let Some(version) = root.get("swagger").and_then(Value::as_str) {
        return if version.trim().starts_with("2.") {
            Ok(version.trim().to_string())
        } else {
            Err(DiscoveryError::parse(format!(
                "unsupported Swagger version '{}'",
                version
            )))
        };
    }

    match root.get("openapi").and_then(Value::as_str) {
        Some(version) if version.trim().starts_with("3.0") => Ok(version.trim().to_string()),
        Some(version) => Err(DiscoveryError::parse(format!(
            "unsupported OpenAPI version '{}'",
            version
        ))),
        None => Err(DiscoveryError::parse(
            "missing 'swagger' or 'openapi' version field",
        )),
    }
}

fn read_parameter(root: &Value, raw: &Value) -> Result<ParameterEntry, String> {
    let param = RawParameter::deserialize(raw).map_err(|e| e.to_string())?;

    // 3.0 declares the type on a schema, which may itself be a reference.
    let schema_type = param.inline_type.or_else(|| {
        raw.get("schema")
            .and_then(|schema| resolve(root, schema))
            .and_then(|schema| schema.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    Ok(ParameterEntry {
        name: param.name,
        location: param.location,
        required: param.required,
        schema_type,
        description: param.description,
    })
}

// Without `schemes` the scheme of the locator applies, so the URL stays
// scheme-relative and is resolved later.
fn swagger2_server_url(root: &Value) -> Option<String> {
    let host = root.get("host").and_then(Value::as_str).map(str::trim);
    let base_path = root
        .get("basePath")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    match host.filter(|h| !h.is_empty()) {
        Some(host) => {
            let scheme = root
                .get("schemes")
                .and_then(Value::as_array)
                .and_then(|schemes| schemes.first())
                .and_then(Value::as_str);
            Some(match scheme {
                Some(scheme) => format!("{}://{}{}", scheme, host, base_path),
                None => format!("//{}{}", host, base_path),
            })
        }
        None => (!base_path.is_empty()).then(|| base_path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore2() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Petstore", "version": "1.0"},
            "host": "petstore.example.com",
            "basePath": "/v2",
            "schemes": ["https", "http"],
            "paths": {
                "/pets/{petId}": {
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true, "type": "integer"}
                    ],
                    "get": {"operationId": "getPet", "summary": "Find pet"},
                    "post": {
                        "parameters": [
                            {"name": "pet", "in": "body", "required": true, "schema": {"type": "object"}}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_swagger2() {
        let document = parse(&petstore2()).unwrap();
        assert_eq!(document.version, "2.0");
        assert_eq!(document.title.as_deref(), Some("Petstore"));
        assert_eq!(
            document.server_url.as_deref(),
            Some("https://petstore.example.com/v2")
        );

        let operations = &document.paths[0].operations;
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0].operation_id.as_deref(), Some("getPet"));
        assert_eq!(operations[0].parameters[0].schema_type.as_deref(), Some("integer"));
        assert!(!operations[0].has_request_body);
        assert!(operations[1].has_request_body);
    }

    #[test]
    fn test_parse_openapi30_schema_types_and_request_body() {
        let root = json!({
            "openapi": "3.0.3",
            "info": {"title": "Items"},
            "servers": [{"url": "/api"}],
            "components": {"schemas": {"Limit": {"type": "integer"}}},
            "paths": {
                "/items": {
                    "get": {
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"$ref": "#/components/schemas/Limit"}},
                            {"name": "session", "in": "cookie", "schema": {"type": "string"}}
                        ]
                    },
                    "post": {"requestBody": {"content": {}}}
                }
            }
        });

        let document = parse(&root).unwrap();
        assert_eq!(document.server_url.as_deref(), Some("/api"));
        let get = &document.paths[0].operations[0];
        assert_eq!(get.parameters[0].schema_type.as_deref(), Some("integer"));
        assert_eq!(get.parameters[1].location, "cookie");
        assert!(document.paths[0].operations[1].has_request_body);
    }

    #[test]
    fn test_swagger2_without_schemes_is_scheme_relative() {
        let mut root = petstore2();
        root.as_object_mut().unwrap().remove("schemes");
        let document = parse(&root).unwrap();
        assert_eq!(document.server_url.as_deref(), Some("//petstore.example.com/v2"));
    }

    #[test]
    fn test_rejects_missing_required_fields() {
        assert!(parse(&json!({"info": {}, "paths": {}})).is_err());
        assert!(parse(&json!({"swagger": "2.0", "paths": {}})).is_err());
        assert!(parse(&json!({"swagger": "2.0", "info": {}})).is_err());
        assert!(parse(&json!({"swagger": "1.2", "info": {}, "paths": {}})).is_err());
        assert!(parse(&json!({"openapi": "4.0.0", "info": {}, "paths": {}})).is_err());
    }

    #[test]
    fn test_malformed_parameter_is_skipped() {
        let root = json!({
            "swagger": "2.0",
            "info": {},
            "paths": {"/x": {"get": {"parameters": [{"in": "query"}, {"name": "ok", "in": "query"}]}}}
        });
        let document = parse(&root).unwrap();
        let names: Vec<_> = document.paths[0].operations[0]
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["ok"]);
    }
}
