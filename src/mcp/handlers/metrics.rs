//! Handler for the metrics tool.

use std::sync::Arc;

use crate::mcp::format::metrics_payload;
use crate::retrieval::RetrievalService;
use rmcp::{ErrorData as McpError, model::CallToolResult};

/// Handle the `metrics` tool, returning the current counters.
pub(crate) async fn handle_metrics(
    retrieval: &Arc<RetrievalService>,
) -> Result<CallToolResult, McpError> {
    let snapshot = retrieval.metrics_snapshot();
    Ok(CallToolResult::structured(metrics_payload(&snapshot)))
}
