//! Chat types and the provider trait.
//!
//! This module provides:
//! - [`ChatRequest`]: request parameters for one chat completion
//! - [`ChatResponse`]: the provider's answer
//! - [`ChatProvider`]: the seam between the invoker and a concrete backend
//!
//! # Example
//!
//! ```rust,ignore
//! use intent_json::prelude::*;
//!
//! let request = ChatRequest::new("gpt-4o-mini")
//!     .system("Reply with a JSON object.")
//!     .user("Hello!")
//!     .response_format(ResponseFormat::JsonObject);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text().unwrap_or_default());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::usage::Usage;

/// A chat completion request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier. Empty means "the provider's default".
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Requested output format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Creates a request for the given model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Appends a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Appends a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Appends an arbitrary message.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the response format.
    #[must_use]
    pub const fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Output format requested from the model.
///
/// Replies are checked against the user's schema after the fact, so only
/// JSON mode is needed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response.
    Text,
    /// Any syntactically valid JSON object.
    JsonObject,
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural stop (end of response).
    #[default]
    Stop,
    /// Maximum token limit reached.
    Length,
    /// Content was filtered by safety systems.
    ContentFilter,
}

impl StopReason {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
        }
    }

    /// Parse a provider finish reason (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            // "stop" and anything unknown
            _ => Self::Stop,
        }
    }

    /// Returns `true` if the model was cut off due to length.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Length)
    }
}

/// A chat completion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message.
    pub message: Message,

    /// Why the model stopped generating.
    pub stop_reason: StopReason,

    /// Token usage statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model identifier used for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Unique completion ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatResponse {
    /// Creates a new response with a message.
    #[must_use]
    pub const fn new(message: Message) -> Self {
        Self {
            message,
            stop_reason: StopReason::Stop,
            usage: None,
            model: None,
            id: None,
        }
    }

    /// Creates a response from text content.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(Message::assistant(content))
    }

    /// Sets the stop reason.
    #[must_use]
    pub const fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the text content of the response.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.message.text()
    }

    /// Returns the refusal text, if the model declined to answer.
    #[must_use]
    pub fn refusal(&self) -> Option<&str> {
        self.message.refusal.as_deref()
    }
}

impl Default for ChatResponse {
    fn default() -> Self {
        Self::new(Message::default())
    }
}

/// Core trait for chat completion backends.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat completion request and receive the complete response.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Get the name of this provider.
    ///
    /// Used for error messages and logging.
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

#[async_trait]
impl<P: ChatProvider + ?Sized> ChatProvider for Arc<P> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).chat(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }
}

/// Type alias for an Arc-wrapped `ChatProvider`.
pub type SharedChatProvider = Arc<dyn ChatProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_builder_appends_messages_in_order() {
        let req = ChatRequest::new("gpt-4o-mini")
            .system("be terse")
            .user("hi")
            .response_format(ResponseFormat::JsonObject);

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.response_format, Some(ResponseFormat::JsonObject));
    }

    #[test]
    fn test_response_format_serialization() {
        let json = serde_json::to_value(ResponseFormat::JsonObject).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "json_object" }));
        let json = serde_json::to_value(ResponseFormat::Text).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "text" }));
    }

    #[test]
    fn test_stop_reason_parse() {
        assert_eq!(StopReason::parse("stop"), StopReason::Stop);
        assert_eq!(StopReason::parse("LENGTH"), StopReason::Length);
        assert_eq!(StopReason::parse("content_filter"), StopReason::ContentFilter);
        assert_eq!(StopReason::parse("something_new"), StopReason::Stop);
        assert!(StopReason::Length.is_truncated());
    }

    #[test]
    fn test_response_text_and_refusal() {
        let response = ChatResponse::from_text("{}");
        assert_eq!(response.text().as_deref(), Some("{}"));
        assert_eq!(response.refusal(), None);
        assert_eq!(ChatResponse::default().text(), None);
    }
}
