//! The form-action boundary.
//!
//! Runs form validation and the invoker, and folds every outcome into a
//! [`PlaygroundState`]: exactly one of `data`, `error` or `fieldErrors` is
//! set. Nothing escapes as an `Err` or a panic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::ChatProvider;
use crate::error::{Error, Result};
use crate::form::{FieldErrors, FormFields};
use crate::invoker::StructuredInvoker;

/// The record a form submission resolves to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundState {
    /// The validated reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Display message of any failure after form validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field messages when form validation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl PlaygroundState {
    /// A successful state.
    #[must_use]
    pub const fn data(value: Value) -> Self {
        Self {
            data: Some(value),
            error: None,
            field_errors: None,
        }
    }

    /// A failed state. Field errors keep their structure; everything else
    /// is reduced to its message.
    #[must_use]
    pub fn failure(error: Error) -> Self {
        match error {
            Error::Validation(fields) => Self::field_errors(fields),
            other => Self {
                error: Some(other.to_string()),
                ..Self::default()
            },
        }
    }

    /// A state carrying per-field messages.
    #[must_use]
    pub const fn field_errors(errors: FieldErrors) -> Self {
        Self {
            data: None,
            error: None,
            field_errors: Some(errors),
        }
    }

    /// Returns `true` when `data` is set.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.data.is_some()
    }
}

impl From<Result<Value>> for PlaygroundState {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::data(value),
            Err(e) => Self::failure(e),
        }
    }
}

/// Validates `fields` and, if they pass, runs `invoker`.
pub async fn analyze<P: ChatProvider>(
    invoker: &StructuredInvoker<P>,
    fields: &FormFields,
) -> PlaygroundState {
    let request = match fields.validate() {
        Ok(request) => request,
        Err(errors) => {
            tracing::info!(fields = errors.len(), "form rejected");
            return PlaygroundState::field_errors(errors);
        }
    };
    invoker.invoke(&request).await.into()
}

/// Like [`analyze`], with an OpenAI provider configured from the
/// environment once the fields have passed validation.
#[cfg(feature = "openai")]
pub async fn analyze_from_env(fields: &FormFields) -> PlaygroundState {
    use crate::llms::OpenAI;

    if let Err(errors) = fields.validate() {
        tracing::info!(fields = errors.len(), "form rejected");
        return PlaygroundState::field_errors(errors);
    }
    match OpenAI::from_env() {
        Ok(provider) => analyze(&StructuredInvoker::new(provider), fields).await,
        Err(e) => {
            tracing::error!(error = %e, "provider is not configured");
            PlaygroundState::failure(e)
        }
    }
}
