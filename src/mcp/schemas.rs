//! JSON schema builders for MCP tools.

use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value};

/// Derive a tool input schema from the request type accepted by its handler.
pub(crate) fn input_schema_for<T: JsonSchema>() -> Map<String, Value> {
    match serde_json::to_value(schema_for!(T)) {
        Ok(Value::Object(mut schema)) => {
            schema.remove("$schema");
            schema
        }
        _ => {
            tracing::warn!("Failed to render tool input schema; advertising an empty object");
            empty_object_schema()
        }
    }
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(Map::new()));
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handlers::ask::AskToolRequest;
    use crate::mcp::handlers::documents::IngestToolRequest;

    #[test]
    fn ask_schema_requires_doc_id_and_question() {
        let schema = input_schema_for::<AskToolRequest>();
        assert_eq!(schema["type"], "object");
        assert!(!schema.contains_key("$schema"));

        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required list")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"doc_id"));
        assert!(required.contains(&"question"));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn ingest_schema_describes_pages_as_string_array() {
        let schema = input_schema_for::<IngestToolRequest>();
        let pages = &schema["properties"]["pages"];
        assert_eq!(pages["type"], "array");
        assert_eq!(pages["items"]["type"], "string");
    }

    #[test]
    fn empty_schema_is_a_closed_object() {
        let schema = empty_object_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
    }
}
