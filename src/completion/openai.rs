//! OpenAI-compatible `/chat/completions` adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionGateway};
use crate::providers::{build_http_client, classify_status, classify_transport, endpoint};

const PROVIDER: &str = "OpenAI";

/// Chat completions client for OpenAI-compatible endpoints.
pub struct OpenAiChat {
    http: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiChat {
    /// Build a new client for `{base_url}/chat/completions`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::Provider("missing OpenAI API key".into()));
        }
        let http = build_http_client("docqa/chat", timeout, Some(api_key))
            .map_err(CompletionError::Provider)?;
        Ok(Self {
            http,
            endpoint: endpoint(base_url, "chat/completions"),
            model,
            max_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl CompletionGateway for OpenAiChat {
    async fn answer(
        &self,
        system_context: &str,
        question: &str,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_context,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                CompletionError::from_failure(classify_transport(PROVIDER, &error, self.timeout))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, model = %self.model, "OpenAI chat request failed");
            return Err(CompletionError::from_failure(classify_status(
                PROVIDER, status, &text,
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|error| {
            CompletionError::Provider(format!("failed to decode OpenAI chat response: {error}"))
        })?;
        Ok(parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}
