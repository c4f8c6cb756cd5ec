//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{DocumentsSnapshot, health_payload, json_resource_contents, serialize_json},
        handlers::{
            ask::{AskToolRequest, handle_ask},
            documents::{IndexToolRequest, IngestToolRequest, handle_index, handle_ingest},
            metrics::handle_metrics,
            retrieval_error,
        },
        registry, schemas,
    },
    retrieval::RetrievalService,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, RawResource, RawResourceTemplate,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceTemplate,
        ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};

const HEALTH_URI: &str = "mcp://health";
const DOCUMENTS_URI: &str = "mcp://documents";
const DOCUMENT_TEMPLATE_URI: &str = "mcp://documents/{doc_id}";
const DOCUMENT_PREFIX: &str = "mcp://documents/";

/// MCP server implementation exposing docqa operations.
#[derive(Clone)]
pub struct DocqaMcpServer {
    retrieval: Arc<RetrievalService>,
    registry: Arc<registry::Registry>,
}

impl DocqaMcpServer {
    /// Create a new MCP server on top of the shared retrieval service.
    pub fn new(retrieval: Arc<RetrievalService>) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(HEALTH_URI, resource_health);
        registry.register_resource(DOCUMENTS_URI, resource_documents);

        registry.register_tool("ingest", tool_ingest);
        registry.register_tool("index", tool_index);
        registry.register_tool("ask", tool_ask);
        registry.register_tool("metrics", tool_metrics);

        Self {
            retrieval,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed("ingest"),
                title: Some("Ingest Document".to_string()),
                description: Some(Cow::Borrowed(
                    "Store a document's extracted page texts and get back the docId used by the other tools.",
                )),
                input_schema: Arc::new(schemas::input_schema_for::<IngestToolRequest>()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Ingest Document")
                        .destructive(false)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("index"),
                title: Some("Index Document".to_string()),
                description: Some(Cow::Borrowed(
                    "Embed every page of a document ahead of the first question. Safe to repeat; an existing index is reused.",
                )),
                input_schema: Arc::new(schemas::input_schema_for::<IndexToolRequest>()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Index Document")
                        .destructive(false)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("ask"),
                title: Some("Ask Document".to_string()),
                description: Some(Cow::Borrowed(
                    "Answer a question from the document's most relevant pages and cite the pages used.",
                )),
                input_schema: Arc::new(schemas::input_schema_for::<AskToolRequest>()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Ask Document")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check ingestion, indexing, and answering counters at a glance.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut health = RawResource::new(HEALTH_URI, "health");
        health.description = Some("Configured embedding and completion providers".into());

        let mut documents = RawResource::new(DOCUMENTS_URI, "documents");
        documents.description = Some("Stored documents with page counts and index status".into());

        vec![health.no_annotation(), documents.no_annotation()]
    }

    fn describe_resource_templates(&self) -> Vec<ResourceTemplate> {
        let document_template = RawResourceTemplate {
            uri_template: DOCUMENT_TEMPLATE_URI.into(),
            name: "document".into(),
            title: Some("Document Details".into()),
            description: Some(
                "Describe one document: replace {doc_id} and call readResource".into(),
            ),
            mime_type: Some(super::format::APPLICATION_JSON.into()),
        };

        vec![document_template.no_annotation()]
    }
}

fn resource_health(
    server: &DocqaMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                HEALTH_URI,
                health_payload(&retrieval.health()),
            )],
        })
    })
}

fn resource_documents(
    server: &DocqaMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move {
        let payload = DocumentsSnapshot {
            documents: retrieval.list_documents(),
        };
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                DOCUMENTS_URI,
                serialize_json(&payload, DOCUMENTS_URI),
            )],
        })
    })
}

fn tool_ingest(server: &DocqaMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move { handle_ingest(&retrieval, request.arguments).await })
}

fn tool_index(server: &DocqaMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move { handle_index(&retrieval, request.arguments).await })
}

fn tool_ask(server: &DocqaMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move { handle_ask(&retrieval, request.arguments).await })
}

fn tool_metrics(server: &DocqaMcpServer, _request: CallToolRequestParam) -> registry::ToolFuture {
    let retrieval = server.retrieval.clone();
    Box::pin(async move { handle_metrics(&retrieval).await })
}

impl ServerHandler for DocqaMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "docqa".to_string();
        implementation.title = Some("docqa MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to ask questions about a document. Ingest its page texts once, then call ask with the returned docId; answers cite the pages they were grounded on.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        let templates = self.describe_resource_templates();
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(templates)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        let retrieval = self.retrieval.clone();
        async move {
            let uri = request.uri.clone();
            if let Some(handler) = self.registry.resources.get(uri.as_str()) {
                return handler(self, request).await;
            }

            if let Some(doc_id) = uri.strip_prefix(DOCUMENT_PREFIX) {
                if doc_id.is_empty() {
                    return Err(McpError::invalid_params(
                        "Document identifier missing in resource URI",
                        None,
                    ));
                }
                let details = retrieval.describe(doc_id).map_err(retrieval_error)?;
                return Ok(ReadResourceResult {
                    contents: vec![json_resource_contents(&uri, serialize_json(&details, &uri))],
                });
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                tracing::debug!(tool = %request.name, "Dispatching tool call");
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::RetrievalSettings;
    use crate::testing::{StubCompletion, StubEmbeddings};

    fn server() -> DocqaMcpServer {
        DocqaMcpServer::new(Arc::new(RetrievalService::new(
            Arc::new(StubEmbeddings::new()),
            Arc::new(StubCompletion::replying("ok")),
            RetrievalSettings::default(),
        )))
    }

    #[test]
    fn every_described_tool_has_a_handler() {
        let server = server();
        let tools = server.describe_tools();
        assert_eq!(tools.len(), server.registry.tools.len());
        for tool in tools {
            assert!(
                server.registry.tools.contains_key(tool.name.as_ref()),
                "missing handler for {}",
                tool.name
            );
        }
    }

    #[test]
    fn every_described_resource_has_a_handler() {
        let server = server();
        for resource in server.describe_resources() {
            assert!(server.registry.resources.contains_key(resource.raw.uri.as_str()));
        }
    }

    #[test]
    fn server_info_advertises_tools_and_resources() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "docqa");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }
}
