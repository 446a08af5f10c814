//! Upstream LLM providers for Veritas.
//!
//! Provides a `VerdictProvider` trait with implementations for:
//! - **Gemini**: `generateContent` on the Gemini API
//! - **Chat completions**: any OpenAI-compatible `/chat/completions` endpoint
//!   (Perplexity by default)
//!
//! Providers return the model's raw text, plus any citation URLs the service
//! attached. Turning that into a verdict is the job of [`crate::check`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::chat_completions::ChatCompletionsClient;
use crate::config::UpstreamConfig;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Header carrying the Gemini API key. Kept out of the URL so transport
/// errors never print it.
const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

/// Sampling temperature sent to every provider. Low, so verdicts are stable.
pub const TEMPERATURE: f32 = 0.2;

// ============================================================================
// VerdictProvider trait
// ============================================================================

/// One upstream answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    /// URLs the service cited for the answer, in its order. Empty for
    /// providers that do not report citations.
    pub citations: Vec<String>,
}

impl From<String> for Completion {
    fn from(text: String) -> Self {
        Self {
            text,
            citations: Vec::new(),
        }
    }
}

impl From<&str> for Completion {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

/// Abstraction over LLM providers that can answer a fact-check prompt.
#[async_trait]
pub trait VerdictProvider: Send + Sync {
    /// Send `prompt` and return the model's answer. A successful call with
    /// no text returns an empty `text`.
    async fn complete(&self, prompt: &str) -> Result<Completion, UpstreamError>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Model identifier sent upstream.
    fn model(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("No upstream provider configured")]
    NotConfigured,

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("All {attempts} attempts failed, last error: {last}")]
    RetryExhausted {
        attempts: usize,
        last: Box<UpstreamError>,
    },
}

impl UpstreamError {
    /// Wrap a reqwest error with its URL stripped. Request URLs can carry
    /// credentials and this error ends up in logs.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        UpstreamError::Http(err.without_url())
    }

    /// Transport failures, rate limits and server errors are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Http(_) => true,
            UpstreamError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Config types
// ============================================================================

/// Settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    /// Overrides the provider's default endpoint (proxies, tests).
    pub base_url: Option<String>,
}

/// Configuration union for the provider factory.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Gemini(ProviderSettings),
    ChatCompletions(ProviderSettings),
}

impl ProviderConfig {
    /// Build from the `[upstream]` config section. The key comes from
    /// `provider_key` if set, otherwise from the provider's env vars.
    pub fn from_upstream(upstream: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let env_key = |vars: &[&str]| {
            vars.iter()
                .find_map(|v| std::env::var(v).ok().filter(|k| !k.trim().is_empty()))
        };

        match upstream.provider.as_str() {
            "gemini" => {
                let api_key = upstream
                    .provider_key
                    .clone()
                    .or_else(|| env_key(&["GOOGLE_API_KEY", "GEMINI_API_KEY"]))
                    .unwrap_or_default();
                Ok(ProviderConfig::Gemini(settings(
                    upstream,
                    api_key,
                    GEMINI_DEFAULT_MODEL,
                )))
            }
            "chat-completions" => {
                let api_key = upstream
                    .provider_key
                    .clone()
                    .or_else(|| env_key(&["PERPLEXITY_API_KEY"]))
                    .unwrap_or_default();
                Ok(ProviderConfig::ChatCompletions(settings(
                    upstream,
                    api_key,
                    crate::chat_completions::DEFAULT_MODEL,
                )))
            }
            other => Err(UpstreamError::UnknownProvider(other.to_string())),
        }
    }
}

fn settings(upstream: &UpstreamConfig, api_key: String, default_model: &str) -> ProviderSettings {
    ProviderSettings {
        api_key,
        model: upstream
            .model_name
            .clone()
            .unwrap_or_else(|| default_model.to_string()),
        timeout: Duration::from_secs(upstream.timeout_seconds),
        max_retries: upstream.max_retries,
        retry_delay_ms: upstream.retry_delay_ms,
        base_url: upstream.base_url.clone(),
    }
}

/// Create the appropriate provider from configuration.
pub fn create_provider(config: ProviderConfig) -> Result<Box<dyn VerdictProvider>, UpstreamError> {
    match config {
        ProviderConfig::Gemini(s) => Ok(Box::new(GeminiClient::new(s)?)),
        ProviderConfig::ChatCompletions(s) => Ok(Box::new(ChatCompletionsClient::new(s)?)),
    }
}

/// HTTP client with the configured timeout. Fails if the key is blank.
pub(crate) fn build_http_client(settings: &ProviderSettings) -> Result<Client, UpstreamError> {
    if settings.api_key.trim().is_empty() {
        return Err(UpstreamError::MissingApiKey);
    }
    Ok(Client::builder().timeout(settings.timeout).build()?)
}

/// Run `attempt` with exponential backoff, retrying only retryable errors.
pub(crate) async fn with_retry<T, F, Fut>(
    settings: &ProviderSettings,
    provider: &str,
    attempt: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, UpstreamError>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(settings.retry_delay_ms.max(1))
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(settings.max_retries);

    match RetryIf::spawn(retry_strategy, attempt, UpstreamError::is_retryable).await {
        Ok(value) => Ok(value),
        Err(e) if e.is_retryable() => {
            let attempts = settings.max_retries + 1;
            tracing::error!(
                provider,
                attempts,
                error = %e,
                "All upstream attempts failed"
            );
            Err(UpstreamError::RetryExhausted {
                attempts,
                last: Box::new(e),
            })
        }
        Err(e) => {
            tracing::error!(provider, error = %e, "Upstream call failed");
            Err(e)
        }
    }
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiClient
// ============================================================================

/// Gemini client - calls `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    settings: ProviderSettings,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, UpstreamError> {
        let client = build_http_client(&settings)?;
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<Completion, UpstreamError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.settings.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(GEMINI_KEY_HEADER, self.settings.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::warn!(code = code, message = %message, "Gemini API error");

            return Err(UpstreamError::Api { code, message });
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(UpstreamError::transport)?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(Completion::from(text))
    }
}

#[async_trait]
impl VerdictProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, UpstreamError> {
        with_retry(&self.settings, self.name(), || self.generate_once(prompt)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
