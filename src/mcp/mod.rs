//! Model Context Protocol (MCP) integration for docqa.
//!
//! This module wires the retrieval service into an MCP server so editors and agent hosts can
//! ingest documents and ask questions about them over stdio. The surface area consists of:
//!
//! - Tools: `ingest`, `index`, `ask`, and `metrics`.
//! - Resources: `mcp://health`, `mcp://documents`, and a templated `mcp://documents/{doc_id}`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::DocqaMcpServer;
