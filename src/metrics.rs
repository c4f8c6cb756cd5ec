use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion, indexing, and question answering.
#[derive(Default)]
pub struct RetrievalMetrics {
    documents_ingested: AtomicU64,
    documents_indexed: AtomicU64,
    chunks_indexed: AtomicU64,
    questions_answered: AtomicU64,
    provider_failures: AtomicU64,
}

impl RetrievalMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored document.
    pub fn record_ingest(&self) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a freshly built index and the number of chunks it holds.
    pub fn record_index(&self, chunk_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a successfully answered question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed embedding or completion call.
    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents stored since startup.
    pub documents_ingested: u64,
    /// Documents whose vector index has been built.
    pub documents_indexed: u64,
    /// Total entries across all built indexes.
    pub chunks_indexed: u64,
    /// Questions answered successfully.
    pub questions_answered: u64,
    /// Embedding or completion calls that failed.
    pub provider_failures: u64,
}
