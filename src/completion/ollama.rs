//! Ollama `/api/chat` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionError, CompletionGateway};
use crate::providers::{build_http_client, classify_status, classify_transport, endpoint};

const PROVIDER: &str = "Ollama";

/// Chat client backed by a local Ollama runtime.
pub struct OllamaChat {
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OllamaChat {
    /// Build a new client for the runtime at `base_url`.
    pub fn new(
        base_url: &str,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http =
            build_http_client("docqa/chat", timeout, None).map_err(CompletionError::Provider)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            model,
            max_tokens,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        endpoint(&self.base_url, "api/chat")
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait]
impl CompletionGateway for OllamaChat {
    async fn answer(
        &self,
        system_context: &str,
        question: &str,
    ) -> Result<String, CompletionError> {
        let payload = json!({
            "model": self.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": system_context },
                { "role": "user", "content": question }
            ],
            "options": {
                "num_predict": self.max_tokens,
                // Keep answers close to the supplied context.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionError::from_failure(classify_transport(PROVIDER, &error, self.timeout))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, endpoint = %self.endpoint(), "Ollama chat request failed");
            return Err(CompletionError::from_failure(classify_status(
                PROVIDER, status, &body,
            )));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|error| {
            CompletionError::Provider(format!("failed to decode Ollama chat response: {error}"))
        })?;

        if !body.done {
            return Err(CompletionError::Provider(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(server: &MockServer) -> OllamaChat {
        OllamaChat::new(
            &server.base_url(),
            "llama3".into(),
            256,
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn handles_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .body_contains("\"stream\":false");
                then.status(200).json_body(json!({
                    "message": { "role": "assistant", "content": "  Bananas are yellow. " },
                    "done": true
                }));
            })
            .await;

        let answer = client(&server)
            .answer("Page 2: Bananas are yellow.", "What color are bananas?")
            .await
            .expect("answer");

        mock.assert_async().await;
        assert_eq!(answer, "Bananas are yellow.");
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({
                    "message": { "role": "assistant", "content": "partial" },
                    "done": false
                }));
            })
            .await;

        let error = client(&server)
            .answer("context", "question")
            .await
            .unwrap_err();
        assert!(matches!(error, CompletionError::Provider(message) if message.contains("incomplete")));
    }

    #[tokio::test]
    async fn error_status_is_a_provider_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500).body("boom");
            })
            .await;

        let error = client(&server)
            .answer("context", "question")
            .await
            .unwrap_err();
        assert!(!error.is_retryable());
        assert!(matches!(error, CompletionError::Provider(message) if message.contains("500")));
    }
}
