//! Entry, hit, status, and error types for the vector index.

use crate::embedding::EmbeddingError;
use thiserror::Error;

/// Embedded page chunk held by a document index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    /// Embedding produced for `text`.
    pub embedding: Vec<f32>,
    /// Page the text came from.
    pub page_number: u32,
    /// Copy of the page text taken when the embedding was generated.
    pub text: String,
}

/// Ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Cosine similarity between the query and the entry, in `[-1, 1]`.
    pub score: f32,
    /// Matching entry.
    pub entry: VectorEntry,
}

/// Lifecycle of a document's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// No index has been built (or the last build failed).
    Unindexed,
    /// A build is in flight.
    Building,
    /// The index is installed and immutable.
    Ready {
        /// Number of entries, equal to the document's page count.
        entries: usize,
    },
}

impl IndexStatus {
    /// Lowercase label used in API payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unindexed => "unindexed",
            Self::Building => "building",
            Self::Ready { .. } => "ready",
        }
    }
}

/// Errors raised while building an index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// No document is stored under the id.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The embedding provider failed (rate limit, timeout, or other remote failure).
    #[error(transparent)]
    Embedding(EmbeddingError),
    /// The number of embeddings does not match the number of pages.
    #[error("Expected {expected} embeddings for the document pages, got {actual}")]
    ShapeMismatch {
        /// Page count.
        expected: usize,
        /// Embeddings received.
        actual: usize,
    },
    /// Embeddings of one document do not share a single dimension.
    #[error("Inconsistent embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the first embedding (or the configured one).
        expected: usize,
        /// Offending dimension.
        actual: usize,
    },
    /// The build task ended without producing a result.
    #[error("Index build interrupted: {0}")]
    Interrupted(String),
}

impl From<EmbeddingError> for IndexError {
    fn from(error: EmbeddingError) -> Self {
        match error {
            EmbeddingError::ShapeMismatch { expected, actual } => {
                Self::ShapeMismatch { expected, actual }
            }
            EmbeddingError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            other => Self::Embedding(other),
        }
    }
}
