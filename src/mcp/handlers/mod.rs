//! Tool handlers for the MCP server.

use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::retrieval::RetrievalError;

pub mod ask;
pub mod documents;
pub mod metrics;

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    let value = arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(JsonObject::new()));
    parse_arguments_value(value)
}

/// Deserialize arguments represented as a JSON value into the target type.
pub(crate) fn parse_arguments_value<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Translate a retrieval failure into the matching MCP error code.
pub(crate) fn retrieval_error(error: RetrievalError) -> McpError {
    let message = error.to_string();
    match error {
        RetrievalError::InvalidRequest(_) => McpError::invalid_params(message, None),
        RetrievalError::NotFound(_) => McpError::resource_not_found(message, None),
        RetrievalError::RateLimited(_) => {
            McpError::internal_error(message, Some(json!({ "retryable": true })))
        }
        RetrievalError::Provider(_) | RetrievalError::Internal(_) => {
            McpError::internal_error(message, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[test]
    fn missing_arguments_parse_as_empty_object() {
        let error = parse_arguments::<Probe>(None).unwrap_err();
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert!(error.message.contains("value"));
    }

    #[test]
    fn arguments_deserialize_into_request_types() {
        let probe: Probe = parse_arguments_value(json!({ "value": 7 })).expect("probe");
        assert_eq!(probe.value, 7);
    }

    #[test]
    fn retrieval_errors_map_to_protocol_codes() {
        assert_eq!(
            retrieval_error(RetrievalError::InvalidRequest("blank".into())).code,
            ErrorCode::INVALID_PARAMS
        );
        assert_eq!(
            retrieval_error(RetrievalError::NotFound("doc".into())).code,
            ErrorCode::RESOURCE_NOT_FOUND
        );

        let limited = retrieval_error(RetrievalError::RateLimited("quota".into()));
        assert_eq!(limited.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(limited.data, Some(json!({ "retryable": true })));

        assert_eq!(
            retrieval_error(RetrievalError::Internal("shape".into())).code,
            ErrorCode::INTERNAL_ERROR
        );
    }
}
