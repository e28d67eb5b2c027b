//! OpenAI API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::chat::ChatRequest;
use crate::error::{LlmError, Result};
use crate::message::{Content, ContentPart, Message};

use super::config::OpenAIConfig;
use super::types::{
    OpenAIChatRequest, OpenAIContent, OpenAIContentPart, OpenAIErrorResponse, OpenAIImageUrl,
    OpenAIMessage, OpenAIResponseFormat,
};

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new OpenAI client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the API key is empty, or an internal error if
    /// the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::auth("openai", "API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key is not set.
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the chat completions URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build request headers for JSON requests.
    pub(crate) fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Convert Message to OpenAI format.
    pub(crate) fn convert_message(msg: &Message) -> OpenAIMessage {
        let content = msg.content.as_ref().map(|c| match c {
            Content::Text(text) => OpenAIContent::Text(text.clone()),
            Content::Parts(parts) => OpenAIContent::Array(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => {
                            OpenAIContentPart::Text { text: text.clone() }
                        }
                        ContentPart::ImageUrl { image_url } => OpenAIContentPart::ImageUrl {
                            image_url: OpenAIImageUrl {
                                url: image_url.url.clone(),
                                detail: image_url.detail.map(|d| d.as_str().to_owned()),
                            },
                        },
                    })
                    .collect(),
            ),
        });

        OpenAIMessage {
            role: msg.role.as_str().to_owned(),
            content,
        }
    }

    /// Build the request body.
    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            response_format: request.response_format.map(OpenAIResponseFormat::from),
        }
    }

    /// Parse an error response from OpenAI.
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(body) {
            let error = error_response.error;
            let code = match error.code {
                Some(Value::String(code)) => Some(code),
                Some(Value::Null) | None => error.error_type,
                Some(other) => Some(other.to_string()),
            };

            return match status {
                401 | 403 => LlmError::auth("openai", error.message),
                429 => LlmError::rate_limited("openai", error.message),
                _ => match code {
                    Some(code) => LlmError::provider_code("openai", code, error.message),
                    None => LlmError::provider("openai", error.message),
                },
            };
        }

        LlmError::http_status(status, body.to_owned())
    }
}
