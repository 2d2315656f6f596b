use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::{ChatMode, Message};
use crate::error::AppError;

/// Why a completion call produced no reply. `Display` is the text shown to
/// the user in place of the assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Invalid API key. Check your key at https://console.groq.com")]
    InvalidCredentials,

    #[error("Usage limit reached. Wait a few minutes and try again.")]
    RateLimited,

    #[error("The request timed out. Check your connection.")]
    Timeout,

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response from the API. Try again.")]
    InvalidResponse,

    #[error("Unexpected error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else if err.is_decode() {
            ChatError::InvalidResponse
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Calls are made once; a timeout is reported, never retried.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub async fn complete(
        &self,
        api_key: &str,
        model: &str,
        mode: ChatMode,
        history: &[Message],
    ) -> Result<String, ChatError> {
        let api_contents: Vec<_> = history.iter().map(|m| m.api_content()).collect();

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = mode.system_prompt() {
            messages.push(WireMessage {
                role: "system",
                content: prompt,
            });
        }
        for (message, content) in history.iter().zip(&api_contents) {
            messages.push(WireMessage {
                role: message.role().as_str(),
                content: content.as_ref(),
            });
        }

        let request = CompletionRequest {
            model,
            messages,
            temperature: mode.temperature(),
            max_tokens: mode.max_tokens(),
        };

        tracing::debug!(
            "requesting completion: model={} mode={:?} messages={}",
            model,
            mode,
            request.messages.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => ChatError::InvalidCredentials,
                429 => ChatError::RateLimited,
                code => ChatError::Http {
                    status: code,
                    body: response.text().await.unwrap_or_default(),
                },
            });
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatError::InvalidResponse)
    }
}
