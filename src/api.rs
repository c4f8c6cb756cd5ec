//! HTTP surface for docqa.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Liveness text.
//! - `POST /api/documents` – Store ordered page texts under a new document id.
//! - `GET /api/documents` – List stored documents with their index status.
//! - `GET /api/documents/:doc_id` – Describe one document.
//! - `POST /api/embedding/generate/:doc_id` – Build the document's vector index ahead of the first
//!   question and return the number of indexed chunks.
//! - `POST /api/chat/query` – Answer `{ "docId", "question" }` with `{ "answer", "citations" }`.
//! - `GET /metrics` – Observe ingestion, indexing, and answering counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Failures are returned as `{ "error": message }` with a status derived from the error kind.
//! The HTTP surface shares the same retrieval service with the MCP server, so behavior is
//! identical across interfaces.

use crate::metrics::MetricsSnapshot;
use crate::retrieval::{
    Answer, AskRequest, DocumentDetails, IngestOutcome, RetrievalApi, RetrievalError,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the question-answering API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RetrievalApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route(
            "/api/documents",
            get(list_documents::<S>).post(ingest_document::<S>),
        )
        .route("/api/documents/:doc_id", get(describe_document::<S>))
        .route(
            "/api/embedding/generate/:doc_id",
            post(generate_embeddings::<S>),
        )
        .route("/api/chat/query", post(query::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

async fn root() -> &'static str {
    "docqa server is running"
}

/// Request body for `POST /api/documents`.
#[derive(Deserialize)]
struct IngestRequest {
    /// Human-readable name, typically the uploaded file name.
    #[serde(default)]
    display_name: String,
    /// Extracted page texts in page order.
    #[serde(default)]
    pages: Vec<String>,
}

/// Store a document and return its generated id.
async fn ingest_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestOutcome>), AppError>
where
    S: RetrievalApi,
{
    let outcome = service.ingest(&request.display_name, request.pages)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Response body for `GET /api/documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentDetails>,
}

async fn list_documents<S>(State(service): State<Arc<S>>) -> Json<DocumentsResponse>
where
    S: RetrievalApi,
{
    Json(DocumentsResponse {
        documents: service.list_documents(),
    })
}

async fn describe_document<S>(
    State(service): State<Arc<S>>,
    Path(doc_id): Path<String>,
) -> Result<Json<DocumentDetails>, AppError>
where
    S: RetrievalApi,
{
    Ok(Json(service.describe(&doc_id)?))
}

/// Success response for `POST /api/embedding/generate/:doc_id`.
#[derive(Serialize)]
struct GenerateResponse {
    doc_id: String,
    /// Number of page chunks held by the document's index.
    chunks_indexed: usize,
}

/// Build the document's vector index if it does not exist yet.
///
/// Concurrent requests for the same document share one build; later requests return the count
/// of the existing index without contacting the embedding provider.
async fn generate_embeddings<S>(
    State(service): State<Arc<S>>,
    Path(doc_id): Path<String>,
) -> Result<Json<GenerateResponse>, AppError>
where
    S: RetrievalApi,
{
    let chunks_indexed = service.index_document(&doc_id).await?;
    tracing::info!(doc_id = %doc_id, chunks = chunks_indexed, "Embedding request completed");
    Ok(Json(GenerateResponse {
        doc_id,
        chunks_indexed,
    }))
}

/// Request body for `POST /api/chat/query`.
#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default, rename = "docId")]
    doc_id: String,
    #[serde(default)]
    question: String,
}

/// Answer a question about a stored document.
async fn query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Answer>, AppError>
where
    S: RetrievalApi,
{
    let answer = service
        .ask(AskRequest {
            doc_id: request.doc_id,
            question: request.question,
        })
        .await?;
    tracing::info!(citations = answer.citations.len(), "Query completed");
    Ok(Json(answer))
}

/// Return the current counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: RetrievalApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "ingest",
                method: "POST",
                path: "/api/documents",
                description: "Store extracted page texts as a document. Blank pages are dropped and the rest are numbered from 1. Response returns { \"doc_id\": string, \"total_pages\": number }.",
                request_example: Some(json!({
                    "display_name": "handbook.pdf",
                    "pages": ["First page text", "Second page text"]
                })),
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/api/documents",
                description: "Return stored documents with their page count and index status.",
                request_example: None,
            },
            CommandDescriptor {
                name: "describe_document",
                method: "GET",
                path: "/api/documents/{doc_id}",
                description: "Return one document's page count, creation time, and index status.",
                request_example: None,
            },
            CommandDescriptor {
                name: "generate_embeddings",
                method: "POST",
                path: "/api/embedding/generate/{doc_id}",
                description: "Embed every page of the document once and keep the vectors in memory. Response returns { \"chunks_indexed\": number }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/api/chat/query",
                description: "Answer a question from the document's most relevant pages. Response returns { \"answer\": string, \"citations\": [{ \"page\": number }] }.",
                request_example: Some(json!({
                    "docId": "3f0e8f9e-8c4b-4b53-9a57-0f4f0c1f6b2a",
                    "question": "What does the warranty cover?"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return ingestion, indexing, and answering counters.",
                request_example: None,
            },
        ],
    })
}

struct AppError(RetrievalError);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RetrievalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RetrievalError::NotFound(_) => StatusCode::NOT_FOUND,
            RetrievalError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            RetrievalError::Provider(_) => StatusCode::BAD_GATEWAY,
            RetrievalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<RetrievalError> for AppError {
    fn from(inner: RetrievalError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::metrics::MetricsSnapshot;
    use crate::retrieval::{
        Answer, AskRequest, Citation, DocumentDetails, IngestOutcome, RetrievalApi,
        RetrievalError, RetrievalService, RetrievalSettings,
    };
    use crate::testing::{StubCompletion, StubEmbeddings};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_query_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let query = commands
            .iter()
            .find(|cmd| cmd.name == "query")
            .expect("query command present");

        assert_eq!(query.method, "POST");
        assert_eq!(query.path, "/api/chat/query");
        assert!(query.description.to_lowercase().contains("question"));

        assert!(commands.iter().any(|cmd| cmd.name == "generate_embeddings"));
        assert!(commands.len() >= 5);
    }

    #[tokio::test]
    async fn query_route_forwards_doc_id_and_question() {
        let service = Arc::new(StubRetrieval::answering(Answer {
            answer: "Apples are red.".into(),
            citations: vec![Citation { page: 1 }, Citation { page: 3 }],
        }));
        let app = create_router(service.clone());

        let (status, body) = send(
            app,
            Method::POST,
            "/api/chat/query",
            Some(json!({ "docId": "doc-1", "question": "What color are apples?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Apples are red.");
        assert_eq!(body["citations"], json!([{ "page": 1 }, { "page": 3 }]));

        let asks = service.recorded_asks();
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0].doc_id, "doc-1");
        assert_eq!(asks[0].question, "What color are apples?");
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let cases = [
            (
                RetrievalError::InvalidRequest("question must not be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (RetrievalError::NotFound("doc-1".into()), StatusCode::NOT_FOUND),
            (
                RetrievalError::RateLimited("quota exceeded".into()),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (RetrievalError::Provider("boom".into()), StatusCode::BAD_GATEWAY),
            (
                RetrievalError::Internal("shape".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let message = error.to_string();
            let app = create_router(Arc::new(StubRetrieval::failing(error)));
            let (status, body) = send(
                app,
                Method::POST,
                "/api/chat/query",
                Some(json!({ "docId": "doc-1", "question": "Why?" })),
            )
            .await;

            assert_eq!(status, expected);
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn generate_route_reports_chunk_count() {
        let service = Arc::new(StubRetrieval::answering(Answer {
            answer: String::new(),
            citations: Vec::new(),
        }));
        let app = create_router(service.clone());

        let (status, body) = send(app, Method::POST, "/api/embedding/generate/doc-7", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "doc_id": "doc-7", "chunks_indexed": 4 }));
        assert_eq!(*service.indexed.lock().expect("indexed lock"), vec!["doc-7"]);
    }

    #[tokio::test]
    async fn full_flow_against_the_real_service() {
        let service = Arc::new(RetrievalService::new(
            Arc::new(StubEmbeddings::new()),
            Arc::new(StubCompletion::replying("Apples are red.")),
            RetrievalSettings::default(),
        ));
        let app = create_router(service);

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/documents",
            Some(json!({
                "display_name": "fruit.pdf",
                "pages": ["Apples are red.", "   ", "Bananas are yellow.", "Cherries are red."]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["total_pages"], 3);
        let doc_id = created["doc_id"].as_str().expect("doc id").to_string();

        let (status, details) =
            send(app.clone(), Method::GET, &format!("/api/documents/{doc_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["index_status"], "unindexed");

        let (status, answer) = send(
            app.clone(),
            Method::POST,
            "/api/chat/query",
            Some(json!({ "docId": doc_id, "question": "What color are apples?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["answer"], "Apples are red.");
        assert_eq!(answer["citations"][0]["page"], 1);

        let (status, listing) = send(app.clone(), Method::GET, "/api/documents", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["documents"][0]["index_status"], "ready");
        assert_eq!(listing["documents"][0]["chunks_indexed"], 3);

        let (status, metrics) = send(app.clone(), Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(metrics["documents_ingested"], 1);
        assert_eq!(metrics["questions_answered"], 1);

        let (status, missing) = send(app, Method::GET, "/api/documents/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"], "Document not found: ghost");
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let service = Arc::new(RetrievalService::new(
            Arc::new(StubEmbeddings::new()),
            Arc::new(StubCompletion::replying("unused")),
            RetrievalSettings::default(),
        ));
        let app = create_router(service);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/chat/query",
            Some(json!({ "question": "What?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("docId"));

        let (status, _) = send(
            app,
            Method::POST,
            "/api/documents",
            Some(json!({ "pages": ["text"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        payload: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match payload {
            Some(payload) => {
                builder = builder.header("content-type", "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    struct StubRetrieval {
        outcome: Result<Answer, RetrievalError>,
        asks: Mutex<Vec<AskRequest>>,
        indexed: Mutex<Vec<String>>,
    }

    impl StubRetrieval {
        fn answering(answer: Answer) -> Self {
            Self {
                outcome: Ok(answer),
                asks: Mutex::new(Vec::new()),
                indexed: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: RetrievalError) -> Self {
            Self {
                outcome: Err(error),
                asks: Mutex::new(Vec::new()),
                indexed: Mutex::new(Vec::new()),
            }
        }

        fn recorded_asks(&self) -> Vec<AskRequest> {
            self.asks.lock().expect("asks lock").clone()
        }
    }

    #[async_trait]
    impl RetrievalApi for StubRetrieval {
        fn ingest(
            &self,
            display_name: &str,
            page_texts: Vec<String>,
        ) -> Result<IngestOutcome, RetrievalError> {
            Ok(IngestOutcome {
                doc_id: "stub-doc".into(),
                display_name: display_name.to_string(),
                total_pages: page_texts.len(),
                created_at: "1970-01-01T00:00:00Z".into(),
            })
        }

        async fn index_document(&self, doc_id: &str) -> Result<usize, RetrievalError> {
            self.indexed
                .lock()
                .expect("indexed lock")
                .push(doc_id.to_string());
            Ok(4)
        }

        async fn ask(&self, request: AskRequest) -> Result<Answer, RetrievalError> {
            self.asks.lock().expect("asks lock").push(request);
            self.outcome.clone()
        }

        fn describe(&self, doc_id: &str) -> Result<DocumentDetails, RetrievalError> {
            Err(RetrievalError::NotFound(doc_id.to_string()))
        }

        fn list_documents(&self) -> Vec<DocumentDetails> {
            Vec::new()
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 0,
                documents_indexed: 0,
                chunks_indexed: 0,
                questions_answered: 0,
                provider_failures: 0,
            }
        }
    }
}
