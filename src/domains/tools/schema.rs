//! Input schema synthesis.
//!
//! Builds the JSON Schema object a protocol client uses to validate the
//! argument map of a tool. The output depends only on the tool definition.

use rmcp::model::JsonObject;
use serde_json::{Value, json};

use super::model::{BODY_PARAM, ParamLocation, ToolDefinition};

const BODY_DESCRIPTION: &str = "JSON request body (fields are defined by the API description)";

/// Synthesize the input schema of a tool.
///
/// Properties are the non-body parameters in declaration order, followed by
/// `body` when the tool takes a request body. `required` is omitted when
/// empty and additional properties are always rejected.
pub fn schema_for(tool: &ToolDefinition) -> JsonObject {
    let mut properties = JsonObject::new();
    let mut required = Vec::new();

    for param in tool.parameters.iter().filter(|p| p.location != ParamLocation::Body) {
        let mut property = JsonObject::new();
        property.insert("type".into(), Value::from(param.param_type.as_str()));
        if let Some(description) = param.description.as_deref().filter(|d| !d.is_empty()) {
            property.insert("description".into(), Value::from(description));
        }
        properties.insert(param.name.clone(), Value::Object(property));

        if param.required {
            required.push(Value::from(param.name.clone()));
        }
    }

    if tool.has_request_body() {
        properties.insert(
            BODY_PARAM.into(),
            json!({
                "type": "object",
                "description": BODY_DESCRIPTION
            }),
        );
        required.push(Value::from(BODY_PARAM));
    }

    let mut schema = JsonObject::new();
    schema.insert("type".into(), Value::from("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
