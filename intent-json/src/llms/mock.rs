//! Mock provider for testing.
//!
//! Replays scripted replies without making any network calls, and records
//! what it was asked so tests can assert on call counts and prompts.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};
use crate::message::Message;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Reply with this text as the assistant content.
    Text(String),
    /// Reply successfully but with no content.
    Empty,
    /// Reply with a refusal and no content.
    Refusal(String),
    /// Fail the call with this provider error.
    Error(LlmError),
}

impl MockReply {
    /// Convenience constructor for a text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Convenience constructor for a JSON reply.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// A deterministic provider for tests.
///
/// Replies are returned in sequence, cycling through them.
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockProvider::new(vec![MockReply::text("{}"), MockReply::Empty]);
/// // first call returns "{}", second returns no content, third returns "{}" again...
/// ```
#[derive(Debug)]
pub struct MockProvider {
    model_id: String,
    replies: Vec<MockReply>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with scripted replies.
    #[must_use]
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            model_id: "mock-model".to_owned(),
            replies,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock provider that always answers with `text`.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![MockReply::text(text)])
    }

    /// Create a mock provider with a custom model ID.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Number of `chat` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request received, if any.
    pub async fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());

        if self.replies.is_empty() {
            return Ok(ChatResponse::default().with_model(self.model_id.clone()));
        }

        let reply = &self.replies[index % self.replies.len()];
        let message = match reply {
            MockReply::Text(text) => Message::assistant(text.clone()),
            MockReply::Empty => Message::empty_assistant(),
            MockReply::Refusal(reason) => Message {
                refusal: Some(reason.clone()),
                ..Message::empty_assistant()
            },
            MockReply::Error(err) => return Err(err.clone().into()),
        };

        Ok(ChatResponse::new(message).with_model(self.model_id.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_cycles_replies() {
        let provider = MockProvider::new(vec![MockReply::text("first"), MockReply::text("second")]);
        let request = ChatRequest::new("m").user("hi");

        let r1 = provider.chat(&request).await.unwrap();
        let r2 = provider.chat(&request).await.unwrap();
        let r3 = provider.chat(&request).await.unwrap();

        assert_eq!(r1.text().as_deref(), Some("first"));
        assert_eq!(r2.text().as_deref(), Some("second"));
        assert_eq!(r3.text().as_deref(), Some("first"));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.last_request().await, Some(request));
    }

    #[tokio::test]
    async fn test_mock_error_and_refusal() {
        let provider = MockProvider::new(vec![
            MockReply::Error(LlmError::network("connection reset")),
            MockReply::Refusal("not allowed".to_owned()),
        ]);
        let request = ChatRequest::new("m");

        let err = provider.chat(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");

        let refused = provider.chat(&request).await.unwrap();
        assert_eq!(refused.text(), None);
        assert_eq!(refused.refusal(), Some("not allowed"));
    }

    #[test]
    fn test_mock_custom_id() {
        let provider = MockProvider::always("{}").with_model_id("custom-mock");
        assert_eq!(provider.default_model(), "custom-mock");
        assert_eq!(provider.call_count(), 0);
    }
}
