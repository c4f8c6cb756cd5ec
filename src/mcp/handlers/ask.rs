//! MCP handler for the question-answering tool.

use std::sync::Arc;

use crate::retrieval::{AskRequest, RetrievalService};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{parse_arguments, retrieval_error};

/// Request payload accepted by the `ask` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct AskToolRequest {
    /// Document to answer from.
    #[serde(alias = "docId")]
    pub(crate) doc_id: String,
    /// Natural language question about the document.
    pub(crate) question: String,
}

/// Handle the `ask` tool, returning the answer and the cited pages.
pub(crate) async fn handle_ask(
    retrieval: &Arc<RetrievalService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: AskToolRequest = parse_arguments(arguments)?;
    let answer = retrieval
        .ask(AskRequest {
            doc_id: args.doc_id,
            question: args.question,
        })
        .await
        .map_err(retrieval_error)?;

    Ok(CallToolResult::structured(json!({
        "answer": answer.answer,
        "citations": answer.citations,
    })))
}
