//! Formatting helpers shared across MCP handlers and resources.

use crate::metrics::MetricsSnapshot;
use crate::retrieval::{DocumentDetails, HealthSnapshot};
use rmcp::model::ResourceContents;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Documents snapshot returned by the `documents` resource.
#[derive(Debug, Serialize)]
pub(crate) struct DocumentsSnapshot {
    /// Stored documents, oldest first.
    pub(crate) documents: Vec<DocumentDetails>,
}

/// Build the health payload summarizing provider configuration.
pub(crate) fn health_payload(snapshot: &HealthSnapshot) -> String {
    let payload = json!({
        "status": "ok",
        "embedding": snapshot.embedding,
        "completion": snapshot.completion,
        "documents": snapshot.documents,
        "topK": snapshot.top_k,
    });
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

/// Camel-cased counters returned by the `metrics` tool.
pub(crate) fn metrics_payload(snapshot: &MetricsSnapshot) -> Value {
    json!({
        "documentsIngested": snapshot.documents_ingested,
        "documentsIndexed": snapshot.documents_indexed,
        "chunksIndexed": snapshot.chunks_indexed,
        "questionsAnswered": snapshot.questions_answered,
        "providerFailures": snapshot.provider_failures,
    })
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}
