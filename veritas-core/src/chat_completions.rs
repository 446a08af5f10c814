//! OpenAI-compatible chat completions provider.
//!
//! Defaults to Perplexity's endpoint. Any service speaking the
//! `/chat/completions` dialect works through `base_url`. Perplexity adds a
//! top-level `citations` array, which is passed through on the
//! [`Completion`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::provider::{
    build_http_client, with_retry, Completion, ProviderSettings, UpstreamError, VerdictProvider,
    TEMPERATURE,
};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";

const SYSTEM_PROMPT: &str = "You are a precise fact-checker. Be concise and accurate.";
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: Option<ChatErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    settings: ProviderSettings,
    base_url: String,
}

impl ChatCompletionsClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, UpstreamError> {
        let client = build_http_client(&settings)?;
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    async fn chat_once(&self, prompt: &str) -> Result<Completion, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .json(&request)
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);
            let code = status.as_u16();

            tracing::warn!(code = code, message = %message, "Chat completions API error");

            return Err(UpstreamError::Api { code, message });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(UpstreamError::transport)?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(Completion {
            text,
            citations: chat_response.citations,
        })
    }
}

#[async_trait]
impl VerdictProvider for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, UpstreamError> {
        with_retry(&self.settings, self.name(), || self.chat_once(prompt)).await
    }

    fn name(&self) -> &str {
        "chat-completions"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}
