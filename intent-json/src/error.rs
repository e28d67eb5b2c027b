//! Unified error types for intent-json.
//!
//! Every stage of an invocation fails with its own variant so callers can
//! react differently to each (surface a field message, fix the schema,
//! retry the provider, ...):
//!
//! - form validation ([`Error::Validation`])
//! - missing configuration ([`Error::Config`])
//! - schema compilation ([`Error::SchemaCompile`])
//! - provider failures ([`Error::Llm`])
//! - empty, malformed or non-conforming replies

use crate::form::FieldErrors;
use crate::schema::{SchemaError, Violations};

pub use crate::llms::error::LlmError;

/// Result type alias for intent-json operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for intent-json.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// One or more required form fields are missing or empty.
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    /// Required configuration (the API credential) is missing or invalid.
    #[error("{0}")]
    Config(String),

    /// The schema source could not be compiled into a validator.
    #[error("Schema parsing error: {0}")]
    SchemaCompile(#[from] SchemaError),

    /// The provider call failed. Reported verbatim.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The provider answered without any content.
    #[error("No content in model response{}", refusal_suffix(.refusal.as_deref()))]
    EmptyResponse {
        /// Refusal text, when the model declined instead of answering.
        refusal: Option<String>,
    },

    /// The reply content is not parseable JSON.
    #[error("Model response is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The reply is JSON but does not satisfy the compiled schema.
    #[error("AI response validation failed: {0}")]
    SchemaMismatch(Violations),
}

fn refusal_suffix(refusal: Option<&str>) -> String {
    refusal.map_or_else(String::new, |r| format!(" (model refused: {r})"))
}

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or empty input fields.
    Validation,
    /// Missing configuration.
    Config,
    /// Schema source failed to compile.
    SchemaCompile,
    /// Network, auth, quota or other provider-side failure.
    Provider,
    /// Provider succeeded but returned no content.
    EmptyResponse,
    /// Content was not JSON.
    MalformedJson,
    /// Content did not match the schema.
    SchemaMismatch,
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Config,
            Self::SchemaCompile(_) => ErrorKind::SchemaCompile,
            Self::Llm(_) => ErrorKind::Provider,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Self::MalformedJson(_) => ErrorKind::MalformedJson,
            Self::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
        }
    }

    /// Returns `true` if the failure came from the model's output rather
    /// than from the input, the configuration or the transport.
    ///
    /// Such failures may go away on a fresh invocation.
    #[must_use]
    pub const fn is_model_output(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmptyResponse | ErrorKind::MalformedJson | ErrorKind::SchemaMismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_display() {
        let err = Error::EmptyResponse { refusal: None };
        assert_eq!(err.to_string(), "No content in model response");

        let err = Error::EmptyResponse {
            refusal: Some("I can't help with that.".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "No content in model response (model refused: I can't help with that.)"
        );
    }

    #[test]
    fn test_llm_error_is_verbatim() {
        let err: Error = LlmError::http_status(503, "upstream unavailable").into();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.to_string(), "HTTP 503: upstream unavailable");
    }

    #[test]
    fn test_model_output_kinds() {
        let malformed = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert!(Error::MalformedJson(malformed).is_model_output());
        assert!(Error::EmptyResponse { refusal: None }.is_model_output());
        assert!(!Error::config("missing key").is_model_output());
    }
}
