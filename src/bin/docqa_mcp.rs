//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes docqa's tools and resources over stdio. This mode is
//! designed for editor/agent integrations and shares all runtime configuration with the HTTP
//! binary. Console logs go to stderr so stdout carries only protocol frames.
use anyhow::{Context, Result};
use docqa::{
    config,
    logging::{self, ConsoleTarget},
    mcp::DocqaMcpServer,
    retrieval::RetrievalService,
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing_with(ConsoleTarget::Stderr);
    let config = config::init_config().context("failed to load configuration")?;

    let retrieval = Arc::new(RetrievalService::from_config(config)?);
    let server = DocqaMcpServer::new(retrieval);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
