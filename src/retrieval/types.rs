//! Request, response, and error types for the retrieval pipeline.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::completion::CompletionError;
use crate::config::Config;
use crate::embedding::EmbeddingError;
use crate::index::{IndexError, IndexStatus};
use crate::store::DocumentSummary;

/// Question about a single stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    /// Document to answer from.
    pub doc_id: String,
    /// Natural language question.
    pub question: String,
}

/// Page referenced by an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// 1-based page number.
    pub page: u32,
}

/// Generated answer plus the pages it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// Completion text, or a fixed fallback when the provider returned nothing.
    pub answer: String,
    /// Distinct pages in ranking order.
    pub citations: Vec<Citation>,
}

/// Result of storing a new document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Generated document identifier.
    pub doc_id: String,
    /// Name supplied at ingestion.
    pub display_name: String,
    /// Number of non-blank pages kept.
    pub total_pages: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Stored document plus the state of its vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDetails {
    /// Document identifier.
    pub doc_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Number of kept pages.
    pub total_pages: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// `unindexed`, `building`, or `ready`.
    pub index_status: &'static str,
    /// Entry count once the index is ready.
    pub chunks_indexed: Option<usize>,
}

impl DocumentDetails {
    pub(crate) fn new(summary: DocumentSummary, status: IndexStatus) -> Self {
        let chunks_indexed = match status {
            IndexStatus::Ready { entries } => Some(entries),
            _ => None,
        };
        Self {
            doc_id: summary.id,
            display_name: summary.display_name,
            total_pages: summary.total_pages,
            created_at: format_timestamp(summary.created_at),
            index_status: status.label(),
            chunks_indexed,
        }
    }
}

/// Provider configuration reported by health probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    /// `provider:model` used for embeddings.
    pub embedding: String,
    /// `provider:model` used for answers.
    pub completion: String,
    /// Number of stored documents.
    pub documents: usize,
    /// Configured number of chunks passed to the completion provider.
    pub top_k: usize,
}

/// Tunables applied by [`super::RetrievalService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    /// Number of ranked chunks used as context.
    pub top_k: usize,
    /// Upper bound for every provider call.
    pub provider_timeout: Duration,
    /// Label describing the embedding provider.
    pub embedding_label: String,
    /// Label describing the completion provider.
    pub completion_label: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            provider_timeout: Duration::from_secs(60),
            embedding_label: "unconfigured".into(),
            completion_label: "unconfigured".into(),
        }
    }
}

impl RetrievalSettings {
    /// Derive settings from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval_top_k,
            provider_timeout: config.provider_timeout(),
            embedding_label: format!(
                "{}:{}",
                config.embedding_provider.label(),
                config.embedding_model
            ),
            completion_label: format!(
                "{}:{}",
                config.completion_provider.label(),
                config.completion_model
            ),
        }
    }
}

/// Failures surfaced to HTTP and MCP callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// Missing or blank input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Unknown document id.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// A provider is rate limited or timed out; try again later.
    #[error("Provider unavailable, try again later: {0}")]
    RateLimited(String),
    /// A provider failed for another reason.
    #[error("Provider request failed: {0}")]
    Provider(String),
    /// Inconsistent provider output or an interrupted build.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EmbeddingError> for RetrievalError {
    fn from(error: EmbeddingError) -> Self {
        match error {
            EmbeddingError::RateLimited(_) | EmbeddingError::Timeout(_) => {
                Self::RateLimited(error.to_string())
            }
            EmbeddingError::Provider(_) => Self::Provider(error.to_string()),
            EmbeddingError::ShapeMismatch { .. } | EmbeddingError::DimensionMismatch { .. } => {
                Self::Internal(error.to_string())
            }
        }
    }
}

impl From<CompletionError> for RetrievalError {
    fn from(error: CompletionError) -> Self {
        if error.is_retryable() {
            Self::RateLimited(error.to_string())
        } else {
            Self::Provider(error.to_string())
        }
    }
}

impl From<IndexError> for RetrievalError {
    fn from(error: IndexError) -> Self {
        match error {
            IndexError::NotFound(doc_id) => Self::NotFound(doc_id),
            IndexError::Embedding(inner) => Self::from(inner),
            IndexError::ShapeMismatch { .. }
            | IndexError::DimensionMismatch { .. }
            | IndexError::Interrupted(_) => Self::Internal(error.to_string()),
        }
    }
}

/// Format a timestamp as RFC 3339.
pub(crate) fn format_timestamp(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
