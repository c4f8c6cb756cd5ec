//! Ollama `/api/embed` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingGateway, ensure_count, ensure_dimension};
use crate::providers::{build_http_client, classify_status, classify_transport, endpoint};

const PROVIDER: &str = "Ollama";

/// Embeddings client backed by a local Ollama runtime.
pub struct OllamaEmbeddings {
    http: Client,
    base_url: String,
    model: String,
    dimension: Option<usize>,
    timeout: Duration,
}

impl OllamaEmbeddings {
    /// Build a new client for the runtime at `base_url`.
    pub fn new(
        base_url: &str,
        model: String,
        dimension: Option<usize>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let http = build_http_client("docqa/embeddings", timeout, None)
            .map_err(EmbeddingError::Provider)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            model,
            dimension,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        endpoint(&self.base_url, "api/embed")
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingGateway for OllamaEmbeddings {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, inputs = texts.len(), "Requesting Ollama embeddings");
        let response = self
            .http
            .post(self.endpoint())
            .json(&EmbedRequest {
                model: &self.model,
                input: &texts,
            })
            .send()
            .await
            .map_err(|error| {
                EmbeddingError::from_failure(classify_transport(PROVIDER, &error, self.timeout))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, endpoint = %self.endpoint(), "Ollama embed request failed");
            return Err(EmbeddingError::from_failure(classify_status(
                PROVIDER, status, &body,
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|error| {
            EmbeddingError::Provider(format!("failed to decode Ollama embed response: {error}"))
        })?;
        ensure_count(texts.len(), body.embeddings.len())?;
        ensure_dimension(self.dimension, &body.embeddings)?;
        Ok(body.embeddings)
    }
}
