//! Answer-generation gateway and its provider adapters.
//!
//! A completion call takes a grounding system context and the user's question and returns free
//! text. Adapters issue chat-style HTTP requests directly, mirroring the embedding adapters.

mod ollama;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ProviderKind};
use crate::providers::ProviderFailure;
use async_trait::async_trait;
use thiserror::Error;

pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

/// Errors surfaced while generating an answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    /// Provider signalled quota or throughput exhaustion.
    #[error("Completion provider rate limited: {0}")]
    RateLimited(String),
    /// Provider did not answer within the configured timeout.
    #[error("Completion request timed out after {0:?}")]
    Timeout(Duration),
    /// Any other remote failure, including undecodable responses.
    #[error("Completion provider failed: {0}")]
    Provider(String),
}

impl CompletionError {
    /// Whether the caller may retry the same request after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Timeout(_))
    }

    pub(crate) fn from_failure(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::RateLimited(message) => Self::RateLimited(message),
            ProviderFailure::Timeout(after) => Self::Timeout(after),
            ProviderFailure::Failed(message) => Self::Provider(message),
        }
    }
}

/// Interface implemented by chat-style answer providers.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Answer `question` using `system_context` as the grounding system message.
    async fn answer(&self, system_context: &str, question: &str)
    -> Result<String, CompletionError>;
}

/// Build the completion gateway selected by the configuration.
pub fn get_completion_gateway(
    config: &Config,
) -> Result<Arc<dyn CompletionGateway>, CompletionError> {
    let timeout = config.provider_timeout();
    tracing::debug!(
        provider = config.completion_provider.label(),
        model = %config.completion_model,
        max_tokens = config.completion_max_tokens,
        "Building completion gateway"
    );
    match config.completion_provider {
        ProviderKind::OpenAI => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                CompletionError::Provider("OPENAI_API_KEY is required for OpenAI chat".into())
            })?;
            Ok(Arc::new(OpenAiChat::new(
                api_key,
                &config.openai_base_url,
                config.completion_model.clone(),
                config.completion_max_tokens,
                timeout,
            )?))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaChat::new(
            &config.ollama_url,
            config.completion_model.clone(),
            config.completion_max_tokens,
            timeout,
        )?)),
    }
}
