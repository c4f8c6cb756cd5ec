//! Retrieval service coordinating the document store, vector index, and provider gateways.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::prompt::{NO_ANSWER, build_context, collect_citations, system_prompt};
use super::types::{
    Answer, AskRequest, DocumentDetails, HealthSnapshot, IngestOutcome, RetrievalError,
    RetrievalSettings, format_timestamp,
};
use crate::completion::{CompletionError, CompletionGateway, get_completion_gateway};
use crate::config::Config;
use crate::embedding::{EmbeddingError, EmbeddingGateway, get_embedding_gateway};
use crate::index::VectorIndex;
use crate::metrics::{MetricsSnapshot, RetrievalMetrics};
use crate::store::DocumentStore;

/// Owns the in-memory state and provider handles shared by the HTTP and MCP surfaces.
///
/// Construct once near process start and share through an `Arc`.
pub struct RetrievalService {
    documents: Arc<DocumentStore>,
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingGateway>,
    completion: Arc<dyn CompletionGateway>,
    metrics: Arc<RetrievalMetrics>,
    settings: RetrievalSettings,
}

/// Abstraction over the retrieval pipeline used by external surfaces (HTTP, MCP).
#[async_trait]
pub trait RetrievalApi: Send + Sync {
    /// Store page texts under a new document id.
    fn ingest(
        &self,
        display_name: &str,
        page_texts: Vec<String>,
    ) -> Result<IngestOutcome, RetrievalError>;

    /// Build the document's index unless it is already present; returns the chunk count.
    async fn index_document(&self, doc_id: &str) -> Result<usize, RetrievalError>;

    /// Answer a question from the document's most relevant pages.
    async fn ask(&self, request: AskRequest) -> Result<Answer, RetrievalError>;

    /// Describe one stored document.
    fn describe(&self, doc_id: &str) -> Result<DocumentDetails, RetrievalError>;

    /// Describe every stored document, oldest first.
    fn list_documents(&self) -> Vec<DocumentDetails>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl RetrievalService {
    /// Assemble a service around the given gateways with empty state.
    pub fn new(
        embedder: Arc<dyn EmbeddingGateway>,
        completion: Arc<dyn CompletionGateway>,
        settings: RetrievalSettings,
    ) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let metrics = Arc::new(RetrievalMetrics::new());
        let index = VectorIndex::new(
            Arc::clone(&documents),
            Arc::clone(&embedder),
            Arc::clone(&metrics),
            settings.provider_timeout,
        );
        Self {
            documents,
            index,
            embedder,
            completion,
            metrics,
            settings,
        }
    }

    /// Build the configured provider gateways and wrap them in a service.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        tracing::info!("Initializing embedding gateway");
        let embedder =
            get_embedding_gateway(config).context("failed to build the embedding gateway")?;
        tracing::info!("Initializing completion gateway");
        let completion =
            get_completion_gateway(config).context("failed to build the completion gateway")?;
        Ok(Self::new(
            embedder,
            completion,
            RetrievalSettings::from_config(config),
        ))
    }

    /// Store page texts under a freshly generated document id.
    pub fn ingest(
        &self,
        display_name: &str,
        page_texts: Vec<String>,
    ) -> Result<IngestOutcome, RetrievalError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(RetrievalError::InvalidRequest(
                "display name must not be empty".into(),
            ));
        }

        let doc_id = Uuid::new_v4().to_string();
        let document = self.documents.put(&doc_id, display_name, page_texts);
        self.metrics.record_ingest();
        tracing::info!(
            doc_id = %doc_id,
            display_name,
            pages = document.pages.len(),
            "Document ingested"
        );

        Ok(IngestOutcome {
            doc_id,
            display_name: document.display_name.clone(),
            total_pages: document.pages.len(),
            created_at: format_timestamp(document.created_at),
        })
    }

    /// Build the document's index unless it is already present; returns the chunk count.
    pub async fn index_document(&self, doc_id: &str) -> Result<usize, RetrievalError> {
        let doc_id = require("doc_id", doc_id)?;
        let chunks = self.index.ensure_indexed(doc_id).await?;
        tracing::info!(doc_id, chunks, "Document index available");
        Ok(chunks)
    }

    /// Answer a question from the document's most relevant pages.
    pub async fn ask(&self, request: AskRequest) -> Result<Answer, RetrievalError> {
        let doc_id = require("docId", &request.doc_id)?;
        let question = require("question", &request.question)?;
        tracing::info!(doc_id, "Answering question");

        self.index.ensure_indexed(doc_id).await?;

        let query = self.embed_question(question).await?;
        if let Some(expected) = self.index.dimension(doc_id) {
            if expected != query.len() {
                return Err(RetrievalError::Internal(format!(
                    "query embedding has dimension {}, index expects {expected}",
                    query.len()
                )));
            }
        }

        let hits = self.index.search(doc_id, &query, self.settings.top_k);
        tracing::debug!(
            doc_id,
            hits = hits.len(),
            top_score = hits.first().map(|hit| hit.score),
            "Retrieved context"
        );

        let context = build_context(&hits);
        let generated = self.generate(&system_prompt(&context), question).await?;
        let answer = if generated.trim().is_empty() {
            NO_ANSWER.to_string()
        } else {
            generated
        };

        self.metrics.record_answer();
        Ok(Answer {
            answer,
            citations: collect_citations(&hits),
        })
    }

    /// Describe one stored document.
    pub fn describe(&self, doc_id: &str) -> Result<DocumentDetails, RetrievalError> {
        let document = self
            .documents
            .get(doc_id)
            .ok_or_else(|| RetrievalError::NotFound(doc_id.to_string()))?;
        Ok(DocumentDetails::new(
            document.summary(),
            self.index.status(doc_id),
        ))
    }

    /// Describe every stored document, oldest first.
    pub fn list_documents(&self) -> Vec<DocumentDetails> {
        self.documents
            .list()
            .into_iter()
            .map(|summary| {
                let status = self.index.status(&summary.id);
                DocumentDetails::new(summary, status)
            })
            .collect()
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Provider configuration and store size for health probes.
    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            embedding: self.settings.embedding_label.clone(),
            completion: self.settings.completion_label.clone(),
            documents: self.documents.len(),
            top_k: self.settings.top_k,
        }
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>, RetrievalError> {
        let timeout = self.settings.provider_timeout;
        self.bounded(
            self.embedder.embed_one(question.to_string()),
            EmbeddingError::Timeout(timeout),
        )
        .await
    }

    async fn generate(&self, system: &str, question: &str) -> Result<String, RetrievalError> {
        let timeout = self.settings.provider_timeout;
        self.bounded(
            self.completion.answer(system, question),
            CompletionError::Timeout(timeout),
        )
        .await
    }

    /// Await a provider call under the configured timeout, counting failures.
    async fn bounded<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: E,
    ) -> Result<T, RetrievalError>
    where
        RetrievalError: From<E>,
        E: std::fmt::Display,
    {
        let outcome = tokio::time::timeout(self.settings.provider_timeout, call)
            .await
            .unwrap_or(Err(on_timeout));
        outcome.map_err(|error| {
            self.metrics.record_provider_failure();
            tracing::warn!(error = %error, "Provider call failed");
            RetrievalError::from(error)
        })
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, RetrievalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RetrievalError::InvalidRequest(format!(
            "{field} must not be empty"
        )))
    } else {
        Ok(trimmed)
    }
}

#[async_trait]
impl RetrievalApi for RetrievalService {
    fn ingest(
        &self,
        display_name: &str,
        page_texts: Vec<String>,
    ) -> Result<IngestOutcome, RetrievalError> {
        RetrievalService::ingest(self, display_name, page_texts)
    }

    async fn index_document(&self, doc_id: &str) -> Result<usize, RetrievalError> {
        RetrievalService::index_document(self, doc_id).await
    }

    async fn ask(&self, request: AskRequest) -> Result<Answer, RetrievalError> {
        RetrievalService::ask(self, request).await
    }

    fn describe(&self, doc_id: &str) -> Result<DocumentDetails, RetrievalError> {
        RetrievalService::describe(self, doc_id)
    }

    fn list_documents(&self) -> Vec<DocumentDetails> {
        RetrievalService::list_documents(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        RetrievalService::metrics_snapshot(self)
    }
}
