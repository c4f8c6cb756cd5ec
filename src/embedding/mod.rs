//! Embedding gateway abstraction and provider adapters.
//!
//! The gateway turns an ordered batch of texts into an equally long, positionally aligned batch
//! of vectors. Provider-specific failures are folded into [`EmbeddingError`] at the adapter
//! boundary.

mod ollama;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ProviderKind};
use crate::providers::ProviderFailure;
use async_trait::async_trait;
use thiserror::Error;

pub use ollama::OllamaEmbeddings;
pub use openai::OpenAiEmbeddings;

/// Errors raised by embedding providers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    /// Provider signalled quota or throughput exhaustion; retry after backing off.
    #[error("Embedding provider rate limited: {0}")]
    RateLimited(String),
    /// Provider did not answer within the configured timeout.
    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),
    /// Any other remote failure.
    #[error("Embedding provider failed: {0}")]
    Provider(String),
    /// Provider returned a different number of vectors than texts requested.
    #[error("Embedding provider returned {actual} vectors for {expected} inputs")]
    ShapeMismatch {
        /// Number of texts submitted.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },
    /// Provider returned vectors whose length disagrees with the expected dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector length.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },
}

impl EmbeddingError {
    /// Whether the caller may retry the same request after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Timeout(_))
    }

    pub(crate) fn from_failure(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::RateLimited(message) => Self::RateLimited(message),
            ProviderFailure::Timeout(after) => Self::Timeout(after),
            ProviderFailure::Failed(message) => Self::Provider(message),
        }
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Produce one embedding vector per input text, in input order.
    ///
    /// Implementations return an empty batch for empty input without contacting the provider.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Largest number of texts sent to the provider in one request.
    ///
    /// `None` means a batch always goes out as a single request.
    fn max_request_size(&self) -> Option<usize> {
        None
    }

    /// Embed a single text as a batch of one.
    async fn embed_one(&self, text: String) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(vec![text]).await?;
        ensure_count(1, vectors.len())?;
        Ok(vectors.remove(0))
    }
}

/// Fail with [`EmbeddingError::ShapeMismatch`] unless the vector count matches the input count.
pub(crate) fn ensure_count(expected: usize, actual: usize) -> Result<(), EmbeddingError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EmbeddingError::ShapeMismatch { expected, actual })
    }
}

/// Fail with [`EmbeddingError::DimensionMismatch`] when a configured dimension is violated.
pub(crate) fn ensure_dimension(
    expected: Option<usize>,
    vectors: &[Vec<f32>],
) -> Result<(), EmbeddingError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match vectors.iter().find(|vector| vector.len() != expected) {
        Some(vector) => Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        None => Ok(()),
    }
}

/// Build the embedding gateway selected by the configuration.
pub fn get_embedding_gateway(
    config: &Config,
) -> Result<Arc<dyn EmbeddingGateway>, EmbeddingError> {
    let timeout = config.provider_timeout();
    tracing::debug!(
        provider = config.embedding_provider.label(),
        model = %config.embedding_model,
        dimension = ?config.embedding_dimension,
        batch_size = config.embedding_batch_size,
        "Building embedding gateway"
    );
    match config.embedding_provider {
        ProviderKind::OpenAI => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                EmbeddingError::Provider("OPENAI_API_KEY is required for OpenAI embeddings".into())
            })?;
            let gateway = OpenAiEmbeddings::new(
                api_key,
                &config.openai_base_url,
                config.embedding_model.clone(),
                config.embedding_dimension,
                config.embedding_batch_size,
                timeout,
            )?;
            Ok(Arc::new(gateway))
        }
        ProviderKind::Ollama => {
            let gateway = OllamaEmbeddings::new(
                &config.ollama_url,
                config.embedding_model.clone(),
                config.embedding_dimension,
                timeout,
            )?;
            Ok(Arc::new(gateway))
        }
    }
}
