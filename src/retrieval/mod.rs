//! Question answering over stored documents: ingestion, lazy indexing, retrieval, and answer
//! generation with page citations.

mod prompt;
mod service;
pub mod types;

pub use service::{RetrievalApi, RetrievalService};
pub use types::{
    Answer, AskRequest, Citation, DocumentDetails, HealthSnapshot, IngestOutcome, RetrievalError,
    RetrievalSettings,
};
