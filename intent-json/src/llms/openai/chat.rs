//! OpenAI `ChatProvider` implementation.

use async_trait::async_trait;
use tracing::Instrument;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, Result};
use crate::message::{Content, Message, Role};

use super::client::OpenAI;
use super::types::OpenAIChatResponse;

impl OpenAI {
    /// Parse the response into `ChatResponse`.
    pub(crate) fn parse_response(response: OpenAIChatResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "empty choices"))?;

        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map_or(StopReason::Stop, StopReason::parse);

        let message = Message {
            role: Role::Assistant,
            content: choice.message.content.map(Content::Text),
            refusal: choice.message.refusal,
        };

        Ok(ChatResponse {
            message,
            stop_reason,
            usage: response.usage,
            model: Some(response.model).filter(|m| !m.is_empty()),
            id: Some(response.id).filter(|id| !id.is_empty()),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        let body = self.build_body(request);

        let span = tracing::info_span!(
            "chat",
            gen_ai.system = "openai",
            gen_ai.request.model = %body.model,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        async move {
            tracing::debug!(messages = body.messages.len(), "sending chat completion request");

            let response = self
                .build_request(&url)
                .json(&body)
                .send()
                .await
                .map_err(LlmError::from)?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                tracing::debug!(status = status.as_u16(), "chat completion request failed");
                return Err(Self::parse_error(status.as_u16(), &error_text).into());
            }

            let response_text = response.text().await.map_err(LlmError::from)?;
            let parsed: OpenAIChatResponse =
                serde_json::from_str(&response_text).map_err(|e| {
                    LlmError::response_format(
                        "valid OpenAI response",
                        format!("parse error: {e}, response: {response_text}"),
                    )
                })?;

            let chat_response = Self::parse_response(parsed)?;

            let span = tracing::Span::current();
            if let Some(id) = &chat_response.id {
                span.record("gen_ai.response.id", id.as_str());
            }
            if let Some(usage) = chat_response.usage {
                span.record("gen_ai.usage.input_tokens", usage.input_tokens);
                span.record("gen_ai.usage.output_tokens", usage.output_tokens);
            }

            Ok(chat_response)
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::Usage;

    fn parse(json: serde_json::Value) -> Result<ChatResponse> {
        OpenAI::parse_response(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn test_parse_response_text() {
        let response = parse(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "{\"ok\":true}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("{\"ok\":true}"));
        assert_eq!(response.stop_reason, StopReason::Stop);
        assert_eq!(response.usage, Some(Usage::new(10, 5)));
        assert_eq!(response.id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn test_parse_response_refusal() {
        let response = parse(serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": null, "refusal": "No." },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        assert_eq!(response.text(), None);
        assert_eq!(response.refusal(), Some("No."));
        assert_eq!(response.model, None);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = parse(serde_json::json!({ "id": "x", "model": "m", "choices": [] })).unwrap_err();
        assert_eq!(err.to_string(), "Expected at least one choice, got empty choices");
    }
}
