//! In-memory document store.
//!
//! Documents are write-once: [`DocumentStore::put`] builds the complete [`Document`] before taking
//! the write lock, so readers observe either the previous value or the new one, never a partial
//! page list.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use time::OffsetDateTime;

/// One page worth of extracted text, the unit of indexing and citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageChunk {
    /// 1-based position among the kept pages; gap-free within a document.
    pub page_number: u32,
    /// Trimmed, non-empty page text.
    pub text: String,
}

/// Immutable page-chunked text of an ingested document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier assigned at ingestion.
    pub id: String,
    /// Human-readable name (typically the uploaded file name).
    pub display_name: String,
    /// Ordered page chunks.
    pub pages: Vec<PageChunk>,
    /// Instant the document was stored.
    pub created_at: OffsetDateTime,
}

impl Document {
    /// Page texts in page order.
    pub fn page_texts(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.text.clone()).collect()
    }

    /// Lightweight description used by listings.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            total_pages: self.pages.len(),
            created_at: self.created_at,
        }
    }
}

/// Listing entry describing a stored document without its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Document identifier.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Number of kept page chunks.
    pub total_pages: usize,
    /// Instant the document was stored.
    pub created_at: OffsetDateTime,
}

/// Process-wide map of documents keyed by id.
#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, Arc<Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document built from ordered page texts.
    ///
    /// Page text is trimmed and blank pages are dropped; the remaining pages are numbered from 1
    /// in input order. A colliding id replaces the previous document.
    pub fn put(&self, id: &str, display_name: &str, page_texts: Vec<String>) -> Arc<Document> {
        let document = Arc::new(Document {
            id: id.to_string(),
            display_name: display_name.to_string(),
            pages: number_pages(page_texts),
            created_at: OffsetDateTime::now_utc(),
        });

        let previous = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::clone(&document));
        if previous.is_some() {
            tracing::warn!(doc_id = id, "Replaced existing document with colliding id");
        }
        tracing::debug!(
            doc_id = id,
            pages = document.pages.len(),
            "Document stored"
        );
        document
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Summaries of every stored document, oldest first.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|document| document.summary())
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no document has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn number_pages(page_texts: Vec<String>) -> Vec<PageChunk> {
    page_texts
        .into_iter()
        .filter_map(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .zip(1u32..)
        .map(|(text, page_number)| PageChunk { page_number, text })
        .collect()
}
