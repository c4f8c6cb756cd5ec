#![deny(missing_docs)]

//! Core library for docqa: ask questions about an ingested document and get answers grounded on
//! its most relevant pages, with page citations.

/// HTTP routing and REST handlers.
pub mod api;
/// Answer-generation gateway and provider adapters.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// Embedding gateway abstraction and adapters.
pub mod embedding;
/// Per-document vector index and similarity ranking.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Ingestion, indexing, and answering counters.
pub mod metrics;
mod providers;
/// Retrieval pipeline shared by the HTTP and MCP surfaces.
pub mod retrieval;
/// In-memory document store.
pub mod store;

#[cfg(test)]
mod testing;
