//! OpenAI-compatible chat completions backend.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! (OpenAI, DeepSeek, vLLM, Ollama's `/v1` shim, ...).

use crate::backend::{AnalysisBackend, AnalysisRequest};
use crate::config::AiConfig;
use crate::error::BackendError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Chat completions response body (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Analysis backend talking to an OpenAI-compatible HTTP API.
pub struct OpenAiBackend {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_seconds: u64,
}

impl OpenAiBackend {
    /// Create a backend from the `[ai]` config section.
    pub fn new(config: &AiConfig) -> Result<Self> {
        info!(
            "Initializing analysis backend with model {} at {}",
            config.model, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_seconds: config.request_timeout_seconds,
        })
    }

    fn build_request<'a>(&'a self, request: &AnalysisRequest<'_>) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_text.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl AnalysisBackend for OpenAiBackend {
    async fn complete(&self, request: AnalysisRequest<'_>) -> Result<String, BackendError> {
        let body = self.build_request(&request);

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(Duration::from_secs(self.timeout_seconds))
                } else if e.is_connect() {
                    BackendError::Connect(self.endpoint.clone())
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let content = extract_content(completion)?;
        debug!("{} response: {} chars", request.kind, content.len());
        Ok(content)
    }
}

/// Pull the first choice's text out of a completion.
fn extract_content(completion: ChatCompletionResponse) -> Result<String, BackendError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(BackendError::EmptyResponse)
}
