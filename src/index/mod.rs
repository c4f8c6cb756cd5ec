//! Per-document vector index with single-flight construction.
//!
//! Each document id moves through `Unindexed -> Building -> Ready`. Concurrent callers of
//! [`VectorIndex::ensure_indexed`] for the same id share one in-flight build; the build runs on
//! its own task so callers that stop waiting do not cancel it. A failed build returns the id to
//! `Unindexed`, and a `Ready` index is never replaced.

mod similarity;
mod types;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::embedding::{EmbeddingError, EmbeddingGateway};
use crate::metrics::RetrievalMetrics;
use crate::store::DocumentStore;

pub use similarity::{cosine_similarity, rank};
pub use types::{IndexError, IndexStatus, SearchHit, VectorEntry};

type BuildFlight = Shared<BoxFuture<'static, Result<usize, IndexError>>>;

enum IndexState {
    Building(BuildFlight),
    Ready(Arc<[VectorEntry]>),
}

struct IndexInner {
    documents: Arc<DocumentStore>,
    embedder: Arc<dyn EmbeddingGateway>,
    metrics: Arc<RetrievalMetrics>,
    timeout: Duration,
    states: RwLock<HashMap<String, IndexState>>,
}

/// In-memory vector indexes keyed by document id.
#[derive(Clone)]
pub struct VectorIndex {
    inner: Arc<IndexInner>,
}

impl VectorIndex {
    /// Create an empty index over `documents`, embedding with `embedder`.
    ///
    /// `timeout` bounds each embedding request issued by a build.
    pub fn new(
        documents: Arc<DocumentStore>,
        embedder: Arc<dyn EmbeddingGateway>,
        metrics: Arc<RetrievalMetrics>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(IndexInner {
                documents,
                embedder,
                metrics,
                timeout,
                states: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Return the entry count of a ready index, building it first when needed.
    ///
    /// Joins a build already in flight for `doc_id` instead of starting another one.
    pub async fn ensure_indexed(&self, doc_id: &str) -> Result<usize, IndexError> {
        let flight = {
            let mut states = self
                .inner
                .states
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match states.get(doc_id) {
                Some(IndexState::Ready(entries)) => return Ok(entries.len()),
                Some(IndexState::Building(flight)) => {
                    tracing::debug!(doc_id, "Joining in-flight index build");
                    flight.clone()
                }
                None => {
                    // The spawned task cannot install its result before this lock is released.
                    let flight = self.spawn_build(doc_id);
                    states.insert(doc_id.to_string(), IndexState::Building(flight.clone()));
                    flight
                }
            }
        };
        flight.await
    }

    /// Embed every page of `doc_id` and install the resulting index.
    ///
    /// This does not coordinate with other builders; prefer [`Self::ensure_indexed`]. When a
    /// ready index already exists it is kept and its entry count returned.
    pub async fn build_index(&self, doc_id: &str) -> Result<usize, IndexError> {
        let document = self
            .inner
            .documents
            .get(doc_id)
            .ok_or_else(|| IndexError::NotFound(doc_id.to_string()))?;

        let texts = document.page_texts();
        let expected = texts.len();
        tracing::info!(doc_id, pages = expected, "Building vector index");

        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embed_pages(texts).await?
        };

        if embeddings.len() != expected {
            return Err(IndexError::ShapeMismatch {
                expected,
                actual: embeddings.len(),
            });
        }
        if let Some(first) = embeddings.first() {
            let dimension = first.len();
            if let Some(other) = embeddings.iter().find(|vector| vector.len() != dimension) {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: other.len(),
                });
            }
        }

        let entries: Arc<[VectorEntry]> = document
            .pages
            .iter()
            .zip(embeddings)
            .map(|(page, embedding)| VectorEntry {
                embedding,
                page_number: page.page_number,
                text: page.text.clone(),
            })
            .collect();

        Ok(self.install(doc_id, entries))
    }

    /// Rank the entries of a ready index against `query`.
    ///
    /// Returns an empty list when `doc_id` has no ready index.
    pub fn search(&self, doc_id: &str, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        let entries = {
            let states = self
                .inner
                .states
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match states.get(doc_id) {
                Some(IndexState::Ready(entries)) => Arc::clone(entries),
                _ => return Vec::new(),
            }
        };
        rank(&entries, query, top_k)
    }

    /// Current lifecycle state of `doc_id`.
    pub fn status(&self, doc_id: &str) -> IndexStatus {
        let states = self
            .inner
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match states.get(doc_id) {
            None => IndexStatus::Unindexed,
            Some(IndexState::Building(_)) => IndexStatus::Building,
            Some(IndexState::Ready(entries)) => IndexStatus::Ready {
                entries: entries.len(),
            },
        }
    }

    /// Embedding dimension of a ready, non-empty index.
    pub fn dimension(&self, doc_id: &str) -> Option<usize> {
        let states = self
            .inner
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match states.get(doc_id) {
            Some(IndexState::Ready(entries)) => entries.first().map(|entry| entry.embedding.len()),
            _ => None,
        }
    }

    async fn embed_pages(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, IndexError> {
        let timeout = self.embedding_budget(texts.len());
        let outcome = tokio::time::timeout(timeout, self.inner.embedder.embed_batch(texts))
            .await
            .unwrap_or(Err(EmbeddingError::Timeout(timeout)));
        outcome.map_err(|error| {
            if matches!(
                error,
                EmbeddingError::RateLimited(_) | EmbeddingError::Timeout(_) | EmbeddingError::Provider(_)
            ) {
                self.inner.metrics.record_provider_failure();
            }
            IndexError::from(error)
        })
    }

    /// Time allowed for embedding `pages` texts: one provider timeout per request the gateway
    /// splits them into.
    fn embedding_budget(&self, pages: usize) -> Duration {
        let requests = self
            .inner
            .embedder
            .max_request_size()
            .map_or(1, |size| pages.div_ceil(size.max(1)))
            .max(1);
        self.inner
            .timeout
            .saturating_mul(u32::try_from(requests).unwrap_or(u32::MAX))
    }

    fn spawn_build(&self, doc_id: &str) -> BuildFlight {
        let builder = self.clone();
        let id = doc_id.to_string();
        let handle = tokio::spawn(async move {
            let outcome = builder.build_index(&id).await;
            if let Err(error) = &outcome {
                tracing::warn!(doc_id = %id, error = %error, "Index build failed");
                builder.abandon_build(&id);
            }
            outcome
        });

        let inner: Weak<IndexInner> = Arc::downgrade(&self.inner);
        let id = doc_id.to_string();
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    if let Some(inner) = inner.upgrade() {
                        VectorIndex { inner }.abandon_build(&id);
                    }
                    Err(IndexError::Interrupted(join_error.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }

    fn install(&self, doc_id: &str, entries: Arc<[VectorEntry]>) -> usize {
        let mut states = self
            .inner
            .states
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(IndexState::Ready(existing)) = states.get(doc_id) {
            tracing::debug!(doc_id, "Keeping existing vector index");
            return existing.len();
        }

        let count = entries.len();
        states.insert(doc_id.to_string(), IndexState::Ready(entries));
        self.inner.metrics.record_index(count as u64);
        tracing::info!(doc_id, entries = count, "Vector index ready");
        count
    }

    fn abandon_build(&self, doc_id: &str) {
        let mut states = self
            .inner
            .states
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(states.get(doc_id), Some(IndexState::Building(_))) {
            states.remove(doc_id);
        }
    }
}
