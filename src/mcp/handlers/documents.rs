//! MCP handlers for document ingestion and indexing tools.

use std::sync::Arc;

use crate::retrieval::RetrievalService;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{parse_arguments, retrieval_error};

/// Request payload accepted by the `ingest` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct IngestToolRequest {
    /// Human-readable document name, typically the source file name.
    #[serde(alias = "displayName")]
    pub(crate) display_name: String,
    /// Extracted page texts in page order. Blank pages are dropped.
    #[serde(default)]
    pub(crate) pages: Vec<String>,
}

/// Request payload accepted by the `index` tool.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct IndexToolRequest {
    /// Identifier returned by `ingest`.
    #[serde(alias = "docId")]
    pub(crate) doc_id: String,
}

/// Handle the `ingest` tool by storing the supplied page texts.
pub(crate) async fn handle_ingest(
    retrieval: &Arc<RetrievalService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: IngestToolRequest = parse_arguments(arguments)?;
    let outcome = retrieval
        .ingest(&args.display_name, args.pages)
        .map_err(retrieval_error)?;

    Ok(CallToolResult::structured(json!({
        "status": "ok",
        "docId": outcome.doc_id,
        "displayName": outcome.display_name,
        "totalPages": outcome.total_pages,
        "createdAt": outcome.created_at,
    })))
}

/// Handle the `index` tool by building the document's vector index if needed.
pub(crate) async fn handle_index(
    retrieval: &Arc<RetrievalService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: IndexToolRequest = parse_arguments(arguments)?;
    let chunks = retrieval
        .index_document(&args.doc_id)
        .await
        .map_err(retrieval_error)?;

    Ok(CallToolResult::structured(json!({
        "status": "ok",
        "docId": args.doc_id,
        "chunksIndexed": chunks,
    })))
}
