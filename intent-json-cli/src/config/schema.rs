//! Configuration file structure.

use intent_json::llms::OpenAIConfig;
use intent_json::message::ImageDetail;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Chat-completion endpoint settings.
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Invocation settings.
    #[serde(default)]
    pub invoke: InvokeSettings,
}

/// Provider endpoint settings. The API key is never read from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Organization ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Invocation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvokeSettings {
    /// Detail level for images (`auto`, `low`, `high`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_detail: Option<ImageDetail>,
}

impl CliConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if let Some(url) = &self.provider.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            issues.push(ConfigIssue::error(
                "provider.base_url",
                format!("`{url}` is not an http(s) URL"),
            ));
        }

        if self.provider.timeout_secs == Some(0) {
            issues.push(ConfigIssue::warning(
                "provider.timeout_secs",
                "Timeout is 0, every request will time out immediately",
            ));
        }

        if self.provider.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            issues.push(ConfigIssue::warning(
                "provider.model",
                "Model is blank, the provider default will be used",
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Build the provider configuration.
    ///
    /// Environment variables win over file values; the credential only
    /// ever comes from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is set.
    pub fn openai_config<F>(&self, lookup: F) -> intent_json::Result<OpenAIConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_set = |name: &str| lookup(name).is_some_and(|v| !v.trim().is_empty());
        let mut config = OpenAIConfig::from_lookup(&lookup)?;
        let provider = &self.provider;

        if let Some(url) = &provider.base_url
            && !is_set(OpenAIConfig::BASE_URL_VAR)
        {
            config = config.with_base_url(url);
        }
        if let Some(model) = provider.model.as_deref().filter(|m| !m.trim().is_empty())
            && !is_set(OpenAIConfig::MODEL_VAR)
        {
            config = config.with_model(model);
        }
        if let Some(org) = &provider.organization
            && !is_set(OpenAIConfig::ORGANIZATION_VAR)
        {
            config = config.with_organization(org);
        }
        if let Some(secs) = provider.timeout_secs {
            config = config.with_timeout(secs);
        }

        Ok(config)
    }

    /// Detail level for images, defaulting to low.
    #[must_use]
    pub fn image_detail(&self) -> ImageDetail {
        self.invoke.image_detail.unwrap_or_default()
    }
}

/// A configuration issue found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "provider.base_url").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The configuration cannot be used.
    Error,
    /// The configuration works but is probably not what was meant.
    Warning,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_parse_file() {
        let config: CliConfig = toml::from_str(
            r#"
            [provider]
            base_url = "http://localhost:11434/v1"
            model = "llava"
            timeout_secs = 30

            [invoke]
            image_detail = "high"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.model.as_deref(), Some("llava"));
        assert_eq!(config.image_detail(), ImageDetail::High);
        assert!(config.is_valid());
    }

    #[test]
    fn test_rejects_unknown_keys_and_api_key() {
        assert!(toml::from_str::<CliConfig>("[provider]\napi_key = \"sk\"").is_err());
        assert!(toml::from_str::<CliConfig>("[nope]").is_err());
    }

    #[test]
    fn test_env_wins_over_file() {
        let config = CliConfig {
            provider: ProviderSettings {
                base_url: Some("http://file.local/v1".into()),
                model: Some("file-model".into()),
                organization: None,
                timeout_secs: Some(10),
            },
            ..CliConfig::default()
        };

        let openai = config
            .openai_config(env(&[
                ("OPEN_AI_SECRET_KEY", "sk-env"),
                ("OPENAI_MODEL", "env-model"),
            ]))
            .unwrap();

        assert_eq!(openai.api_key, "sk-env");
        assert_eq!(openai.model, "env-model");
        assert_eq!(openai.base_url, "http://file.local/v1");
        assert_eq!(openai.timeout_secs, Some(10));
    }

    #[test]
    fn test_missing_key_is_reported() {
        let err = CliConfig::default().openai_config(env(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPEN_AI_SECRET_KEY is not set in the environment variables."
        );
    }

    #[test]
    fn test_validate_issues() {
        let config = CliConfig {
            provider: ProviderSettings {
                base_url: Some("ftp://x".into()),
                timeout_secs: Some(0),
                ..ProviderSettings::default()
            },
            ..CliConfig::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(!config.is_valid());
    }
}
