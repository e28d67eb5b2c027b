//! Schema-validated model invocation.
//!
//! [`StructuredInvoker::invoke`] is a guarded pipeline of fallible steps:
//!
//! 1. compile the schema-source (the provider is not called if this fails)
//! 2. call the provider, asking for a JSON object
//! 3. parse the reply as JSON
//! 4. validate it against the compiled schema
//!
//! Each step fails with its own [`Error`] variant. Nothing is cached: the
//! schema is recompiled on every call and no state survives between calls.

use serde_json::Value;
use tracing::Instrument;

use crate::chat::{ChatProvider, ChatRequest, ResponseFormat};
use crate::error::{Error, Result};
use crate::form::InvocationRequest;
use crate::message::{ImageDetail, Message};
use crate::schema;

/// Appended to the instruction, followed by the schema-source.
pub const SCHEMA_RESTATEMENT: &str =
    "You must respond in a valid JSON format, adhering to the following schema:";

/// The system message: the instruction plus a restatement of the schema.
#[must_use]
pub fn system_message(instruction: &str, schema_source: &str) -> String {
    format!("{instruction}\n\n{SCHEMA_RESTATEMENT}\n\n{schema_source}")
}

/// Calls a chat provider and gates its output with a user-supplied schema.
///
/// The invoker holds no mutable state; share it freely across tasks.
///
/// # Example
///
/// ```rust,ignore
/// let invoker = StructuredInvoker::new(OpenAI::from_env()?).with_image_detail(ImageDetail::High);
/// let request = FormFields::image(url, prompt, schema).validate()?;
/// let data = invoker.invoke(&request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StructuredInvoker<P> {
    provider: P,
    model: Option<String>,
    image_detail: ImageDetail,
}

impl<P: ChatProvider> StructuredInvoker<P> {
    /// Create an invoker using the provider's default model and low image detail.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            model: None,
            image_detail: ImageDetail::Low,
        }
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the detail level used for images.
    #[must_use]
    pub const fn with_image_detail(mut self, detail: ImageDetail) -> Self {
        self.image_detail = detail;
        self
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Build the chat request for `request` without sending it.
    #[must_use]
    pub fn build_request(&self, request: &InvocationRequest) -> ChatRequest {
        ChatRequest::new(self.model())
            .system(system_message(&request.instruction, &request.schema_source))
            .message(Message::user_parts(
                request.content.to_parts(self.image_detail),
            ))
            .response_format(ResponseFormat::JsonObject)
    }

    /// Run the pipeline and return the validated reply, unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaCompile`] if the schema-source is unusable
    /// - [`Error::Llm`] if the provider call fails
    /// - [`Error::EmptyResponse`] if the reply has no content
    /// - [`Error::MalformedJson`] if the reply is not JSON
    /// - [`Error::SchemaMismatch`] if the reply does not fit the schema
    pub async fn invoke(&self, request: &InvocationRequest) -> Result<Value> {
        let span = tracing::info_span!(
            "invoke",
            provider = self.provider.provider_name(),
            gen_ai.request.model = %self.model(),
            content = request.content.kind(),
            schema.format = tracing::field::Empty,
        );

        async move {
            let compiled = schema::compile(&request.schema_source).inspect_err(|e| {
                tracing::warn!(error = %e, "schema-source rejected");
            })?;
            tracing::Span::current().record("schema.format", tracing::field::debug(compiled.format()));

            let chat_request = self.build_request(request);
            tracing::debug!(
                messages = chat_request.messages.len(),
                "requesting structured completion"
            );
            let response = self.provider.chat(&chat_request).await?;

            if response.stop_reason.is_truncated() {
                tracing::warn!(
                    stop_reason = response.stop_reason.as_str(),
                    "model reply was cut short"
                );
            }

            let Some(content) = response.text().filter(|text| !text.trim().is_empty()) else {
                let refusal = response.refusal().map(str::to_owned);
                if let Some(reason) = &refusal {
                    tracing::warn!(refusal = %reason, "model refused the task");
                }
                return Err(Error::EmptyResponse { refusal });
            };

            let value: Value = serde_json::from_str(&content).map_err(|e| {
                tracing::warn!(error = %e, "model reply is not JSON");
                Error::MalformedJson(e)
            })?;

            compiled.validate(&value).map_err(|violations| {
                tracing::warn!(violations = violations.len(), "model reply does not fit the schema");
                Error::SchemaMismatch(violations)
            })?;

            tracing::info!("structured reply validated");
            Ok(value)
        }
        .instrument(span)
        .await
    }
}
