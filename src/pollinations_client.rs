use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::Config;

/// A role-tagged message as the chat endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
    pub stream: bool,
    #[serde(rename = "private")]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any.
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

/// Ways a chat request can fail.
#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("chat endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("chat request timed out")]
    Timeout,

    #[error("chat endpoint returned status {0}")]
    Status(u16),

    #[error("could not parse chat response: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl ChatApiError {
    /// The sentence shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ChatApiError::Unreachable(_) => {
                "No internet connection. Please check your network.".to_string()
            }
            ChatApiError::Timeout => "Request timed out. Please try again.".to_string(),
            ChatApiError::Status(code) => {
                format!("Server error ({}). Please try again later.", code)
            }
            ChatApiError::Parse(_) => "Response parsing error. Please try again.".to_string(),
            ChatApiError::Other(message) => {
                let message = if message.trim().is_empty() {
                    "Unknown error"
                } else {
                    message.as_str()
                };
                format!("Connection error: {}.", message)
            }
        }
    }
}

impl From<reqwest::Error> for ChatApiError {
    fn from(err: reqwest::Error) -> Self {
        // A connect timeout is both; report it as a timeout.
        if err.is_timeout() {
            ChatApiError::Timeout
        } else if err.is_connect() {
            ChatApiError::Unreachable(err.to_string())
        } else if err.is_decode() {
            ChatApiError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ChatApiError::Status(status.as_u16())
        } else {
            ChatApiError::Other(err.to_string())
        }
    }
}

/// Anything that can answer a chat completion request.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Returns the reply text, or `None` when the endpoint answered without
    /// usable content.
    async fn chat(&self, request: &ChatRequest) -> Result<Option<String>, ChatApiError>;
}

pub struct PollinationsClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl PollinationsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: config.api_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl ChatApi for PollinationsClient {
    async fn chat(&self, request: &ChatRequest) -> Result<Option<String>, ChatApiError> {
        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            messages = request.messages.len(),
            "Sending request to chat API"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Chat API request failed: {}", e);
                ChatApiError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Chat API returned {}: {}", status, error_text);
            return Err(ChatApiError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("Received response from chat API: {}", body);

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Chat API response did not match the expected shape: {}", e);
            ChatApiError::Parse(e.to_string())
        })?;

        let content = parsed.into_content();
        if content.is_none() {
            warn!("Chat API response carried no content");
        }
        Ok(content)
    }
}
