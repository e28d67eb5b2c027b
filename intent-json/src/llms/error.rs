//! Error types for LLM provider operations.
//!
//! [`LlmError`] covers the failure modes of talking to a chat-completion
//! backend (authentication, rate limiting, network issues, etc.).
//! It integrates into the crate-level [`Error`](crate::Error) via `Error::Llm`
//! and is surfaced to callers verbatim.

/// Error type for LLM provider operations.
///
/// Each variant represents a distinct failure mode so callers can decide
/// for themselves whether a failure is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// Authentication or authorization failure.
    #[error("[{provider}] {message}")]
    Auth {
        /// Provider name (e.g., "openai").
        provider: String,
        /// Error description.
        message: String,
    },

    /// Rate limit or quota exceeded.
    #[error("[{provider}] {message}")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// Error description as reported by the provider.
        message: String,
    },

    /// Response format error.
    #[error("Expected {expected}, got {got}")]
    ResponseFormat {
        /// Expected format description.
        expected: String,
        /// Actual format received.
        got: String,
    },

    /// Network or connection error.
    #[error("{0}")]
    Network(String),

    /// HTTP status error with a body the provider did not structure.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Provider-specific error.
    #[error("[{provider}] {message}")]
    Provider {
        /// Provider name.
        provider: String,
        /// Error description.
        message: String,
        /// Optional error code from the provider.
        code: Option<String>,
    },

    /// Internal error.
    #[error("{0}")]
    Internal(String),
}

impl LlmError {
    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ResponseFormat {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a provider-specific error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Create a provider error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the failure is transient.
    ///
    /// Nothing in this crate retries; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }
}

#[cfg(feature = "openai")]
impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_provider() {
        let err = LlmError::auth("openai", "Incorrect API key provided");
        assert_eq!(err.to_string(), "[openai] Incorrect API key provided");
    }

    #[test]
    fn test_retryable() {
        assert!(LlmError::network("reset").is_retryable());
        assert!(LlmError::rate_limited("openai", "slow down").is_retryable());
        assert!(!LlmError::auth("openai", "bad key").is_retryable());
        assert!(!LlmError::http_status(500, "oops").is_retryable());
    }
}
