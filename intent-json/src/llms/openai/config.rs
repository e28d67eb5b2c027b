//! OpenAI client configuration.

use crate::error::{Error, Result};

/// Configuration for the OpenAI client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API (defaults to OpenAI's API).
    pub base_url: String,
    /// Default model to use.
    pub model: String,
    /// Optional organization ID.
    pub organization: Option<String>,
    /// Request timeout in seconds. `None` leaves the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Default OpenAI API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    /// Environment variable holding the API key.
    pub const API_KEY_VAR: &'static str = "OPEN_AI_SECRET_KEY";
    /// Fallback environment variable for the API key.
    pub const FALLBACK_API_KEY_VAR: &'static str = "OPENAI_API_KEY";
    /// Environment variable overriding the base URL.
    pub const BASE_URL_VAR: &'static str = "OPENAI_BASE_URL";
    /// Environment variable overriding the default model.
    pub const MODEL_VAR: &'static str = "OPENAI_MODEL";
    /// Environment variable holding the organization ID.
    pub const ORGANIZATION_VAR: &'static str = "OPENAI_ORGANIZATION";

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `OPEN_AI_SECRET_KEY` (or `OPENAI_API_KEY`) - required API key
    /// - `OPENAI_BASE_URL` - optional base URL
    /// - `OPENAI_MODEL` - optional default model
    /// - `OPENAI_ORGANIZATION` - optional organization ID
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is found.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get(Self::API_KEY_VAR)
            .or_else(|| get(Self::FALLBACK_API_KEY_VAR))
            .ok_or_else(|| {
                Error::config(format!(
                    "{} is not set in the environment variables.",
                    Self::API_KEY_VAR
                ))
            })?;

        let base_url =
            get(Self::BASE_URL_VAR).unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_owned());
        let model = get(Self::MODEL_VAR).unwrap_or_else(|| Self::DEFAULT_MODEL.to_owned());
        let organization = get(Self::ORGANIZATION_VAR);

        Ok(Self {
            api_key,
            base_url,
            model,
            organization,
            timeout_secs: None,
        })
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            organization: None,
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ErrorKind;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_new() {
        let config = OpenAIConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, OpenAIConfig::DEFAULT_BASE_URL);
        assert_eq!(config.model, OpenAIConfig::DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAIConfig::new("key")
            .with_model("gpt-4o")
            .with_timeout(60)
            .with_organization("org-1");

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.organization.as_deref(), Some("org-1"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = OpenAIConfig::from_lookup(lookup(&[("OPENAI_MODEL", "gpt-4o")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(
            err.to_string(),
            "OPEN_AI_SECRET_KEY is not set in the environment variables."
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let result = OpenAIConfig::from_lookup(lookup(&[("OPEN_AI_SECRET_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_key_and_overrides() {
        let config = OpenAIConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-fallback"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("OPENAI_MODEL", "gpt-4o"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-fallback");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.organization, None);
    }

    #[test]
    fn test_primary_key_wins() {
        let config = OpenAIConfig::from_lookup(lookup(&[
            ("OPEN_AI_SECRET_KEY", "sk-primary"),
            ("OPENAI_API_KEY", "sk-fallback"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "sk-primary");
    }
}
