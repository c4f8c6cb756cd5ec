use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 256;
const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 512;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRIEVAL_TOP_K: usize = 5;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docqa server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider used to generate vector representations of page text.
    pub embedding_provider: ProviderKind,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Expected dimensionality of the produced vectors, when known.
    pub embedding_dimension: Option<usize>,
    /// Maximum number of texts sent in a single embedding request.
    pub embedding_batch_size: usize,
    /// Provider used to generate answers.
    pub completion_provider: ProviderKind,
    /// Chat model identifier passed to the completion provider.
    pub completion_model: String,
    /// Upper bound on generated answer tokens.
    pub completion_max_tokens: u32,
    /// API key for OpenAI-compatible endpoints.
    pub openai_api_key: Option<String>,
    /// Base URL for OpenAI-compatible endpoints (without the trailing route).
    pub openai_base_url: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Upper bound for every embedding or completion call.
    pub provider_timeout_secs: u64,
    /// Number of ranked chunks used to ground an answer.
    pub retrieval_top_k: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported remote backends for embeddings and completions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI (or compatible) API.
    OpenAI,
}

impl ProviderKind {
    /// Lowercase label used in logs and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_provider = parse_provider("EMBEDDING_PROVIDER", &load_env("EMBEDDING_PROVIDER")?)?;
        let completion_provider = match load_env_optional("COMPLETION_PROVIDER") {
            Some(value) => parse_provider("COMPLETION_PROVIDER", &value)?,
            None => embedding_provider,
        };
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        let uses_openai = embedding_provider == ProviderKind::OpenAI
            || completion_provider == ProviderKind::OpenAI;
        if uses_openai && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        Ok(Self {
            embedding_provider,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: parse_optional("EMBEDDING_DIMENSION")?,
            embedding_batch_size: parse_optional("EMBEDDING_BATCH_SIZE")?
                .unwrap_or(DEFAULT_EMBEDDING_BATCH_SIZE),
            completion_provider,
            completion_model: load_env("COMPLETION_MODEL")?,
            completion_max_tokens: parse_optional("COMPLETION_MAX_TOKENS")?
                .unwrap_or(DEFAULT_COMPLETION_MAX_TOKENS),
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            provider_timeout_secs: parse_optional("PROVIDER_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            retrieval_top_k: parse_optional("RETRIEVAL_TOP_K")?.unwrap_or(DEFAULT_RETRIEVAL_TOP_K),
            server_port: parse_optional("SERVER_PORT")?,
        }
        .validated()?)
    }

    /// Timeout applied to every provider call.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.embedding_batch_size == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_BATCH_SIZE".into()));
        }
        if self.embedding_dimension == Some(0) {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("PROVIDER_TIMEOUT_SECS".into()));
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::InvalidValue("RETRIEVAL_TOP_K".into()));
        }
        Ok(self)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_provider(key: &str, value: &str) -> Result<ProviderKind, ConfigError> {
    value
        .parse()
        .map_err(|()| ConfigError::InvalidValue(key.to_string()))
}

impl std::str::FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Reads `.env` first when present. Subsequent calls return the already installed value.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        embedding_provider = config.embedding_provider.label(),
        embedding_model = %config.embedding_model,
        completion_provider = config.completion_provider.label(),
        completion_model = %config.completion_model,
        server_port = ?config.server_port,
        top_k = config.retrieval_top_k,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
