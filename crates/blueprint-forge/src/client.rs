//! Generation-service client.
//!
//! The service is a black box: one chat request in, one text response out.
//! Deadlines are applied by the caller with `tokio::time::timeout`, never
//! here, so drafting and file synthesis can use different budgets against
//! the same client. The [`ChatService`] trait is the seam the pipeline is
//! tested through.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
    pub stream: bool,
}

impl ChatRequest {
    pub fn single(model: impl Into<String>, prompt: impl Into<String>, options: ChatOptions) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            options,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One bounded request/response exchange with the generation backend.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<String>;
}

/// Ollama-style cloud chat endpoint (`POST {base}/api/chat`, bearer key).
pub struct HttpChatService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpChatService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("generation request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("generation service returned {status}: {body}"));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("generation response was not valid JSON")?;
        Ok(parsed.message.content)
    }
}
