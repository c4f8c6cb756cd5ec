//! OpenAI-compatible `/embeddings` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingGateway, ensure_count, ensure_dimension};
use crate::providers::{build_http_client, classify_status, classify_transport, endpoint};

const PROVIDER: &str = "OpenAI";

/// Embeddings client that talks to OpenAI-compatible endpoints.
pub struct OpenAiEmbeddings {
    http: Client,
    endpoint: String,
    model: String,
    dimension: Option<usize>,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAiEmbeddings {
    /// Build a new client for `{base_url}/embeddings`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        dimension: Option<usize>,
        batch_size: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::Provider("missing OpenAI API key".into()));
        }
        if model.trim().is_empty() {
            return Err(EmbeddingError::Provider("missing OpenAI model name".into()));
        }
        let http = build_http_client("docqa/embeddings", timeout, Some(api_key))
            .map_err(EmbeddingError::Provider)?;
        Ok(Self {
            http,
            endpoint: endpoint(base_url, "embeddings"),
            model,
            dimension,
            batch_size: batch_size.max(1),
            timeout,
        })
    }

    async fn request_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                EmbeddingError::from_failure(classify_transport(PROVIDER, &error, self.timeout))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = classify_status(PROVIDER, status, &body);
            tracing::warn!(status = %status, inputs = inputs.len(), "OpenAI embeddings request failed");
            return Err(EmbeddingError::from_failure(failure));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|error| {
            EmbeddingError::Provider(format!("failed to decode OpenAI embedding response: {error}"))
        })?;
        aligned_vectors(inputs.len(), parsed.data)
    }
}

/// Order vectors by their `index` field, requiring each position in `0..expected` exactly once.
fn aligned_vectors(
    expected: usize,
    mut data: Vec<EmbeddingData>,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    data.sort_by_key(|entry| entry.index);
    ensure_count(expected, data.len())?;
    if data
        .iter()
        .enumerate()
        .any(|(position, entry)| entry.index != position)
    {
        let mut covered: Vec<usize> = data
            .iter()
            .map(|entry| entry.index)
            .filter(|index| *index < expected)
            .collect();
        covered.dedup();
        return Err(EmbeddingError::ShapeMismatch {
            expected,
            actual: covered.len(),
        });
    }
    Ok(data.into_iter().map(|entry| entry.embedding).collect())
}

#[async_trait]
impl EmbeddingGateway for OpenAiEmbeddings {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            model = %self.model,
            inputs = texts.len(),
            batch_size = self.batch_size,
            "Requesting OpenAI embeddings"
        );
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.request_batch(batch).await?);
        }
        ensure_count(texts.len(), embeddings.len())?;
        ensure_dimension(self.dimension, &embeddings)?;
        Ok(embeddings)
    }

    fn max_request_size(&self) -> Option<usize> {
        Some(self.batch_size)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
