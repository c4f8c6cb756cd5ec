//! HTTP plumbing shared by the embedding and completion adapters.
//!
//! Provider responses are classified once here into a closed [`ProviderFailure`] set; the gateway
//! error types convert from it so nothing downstream inspects status codes or error bodies.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Classified outcome of a failed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProviderFailure {
    /// Quota or throughput exhaustion (HTTP 429 or a quota error code in the body).
    RateLimited(String),
    /// The request did not complete within the configured timeout.
    Timeout(Duration),
    /// Any other transport or provider-side failure.
    Failed(String),
}

/// Build a reqwest client with the shared user agent, timeout, and optional bearer token.
pub(crate) fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    bearer_token: Option<&str>,
) -> Result<Client, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer_token {
        let auth = format!("Bearer {}", token.trim());
        let value = HeaderValue::from_str(&auth).map_err(|_| "invalid API key".to_string())?;
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|error| format!("failed to build HTTP client: {error}"))
}

/// Join a base URL and a route without doubling slashes.
pub(crate) fn endpoint(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

/// Classify a transport-level reqwest failure.
pub(crate) fn classify_transport(
    provider: &str,
    error: &reqwest::Error,
    timeout: Duration,
) -> ProviderFailure {
    if error.is_timeout() {
        ProviderFailure::Timeout(timeout)
    } else {
        ProviderFailure::Failed(format!("failed to reach {provider}: {error}"))
    }
}

/// Classify a non-success HTTP response from a provider.
pub(crate) fn classify_status(provider: &str, status: StatusCode, body: &str) -> ProviderFailure {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    if status == StatusCode::TOO_MANY_REQUESTS || is_quota_exhausted(body) {
        ProviderFailure::RateLimited(format!("{provider} rate limit exceeded: {message}"))
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        ProviderFailure::Failed(format!("{provider} timed out upstream ({status}): {message}"))
    } else {
        ProviderFailure::Failed(format!("{provider} returned {status}: {message}"))
    }
}

/// Whether an OpenAI-style error envelope reports quota or rate-limit exhaustion.
fn is_quota_exhausted(body: &str) -> bool {
    const MARKERS: [&str; 2] = ["insufficient_quota", "rate_limit_exceeded"];
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let Some(error) = value.get("error").and_then(Value::as_object) else {
        return false;
    };
    ["type", "code"]
        .iter()
        .filter_map(|key| error.get(*key).and_then(Value::as_str))
        .any(|marker| MARKERS.contains(&marker))
}

/// Pull a human-readable message out of the common provider error envelopes.
///
/// OpenAI responds with `{"error": {"message": ...}}`, Ollama with `{"error": "..."}`.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = match error {
        Value::String(text) => text.clone(),
        Value::Object(map) => map.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
