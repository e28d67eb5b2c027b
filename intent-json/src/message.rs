//! Message types for model communication.
//!
//! These follow the chat completion API conventions: a message has a role
//! and content, and user content may mix text with image references.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions.
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Level of detail the model should use when looking at an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Let the provider decide.
    Auto,
    /// Low resolution, cheapest.
    #[default]
    Low,
    /// High resolution.
    High,
}

impl ImageDetail {
    /// Returns the string representation for the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for ImageDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown image detail `{other}`, expected auto, low or high"
            )),
        }
    }
}

/// An image reference: a remote URL or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// The URL.
    pub url: String,
    /// Optional detail level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// One part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text part.
    Text {
        /// The text.
        text: String,
    },
    /// Image part.
    ImageUrl {
        /// The image reference.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Creates a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image part.
    #[must_use]
    pub fn image_url(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }
}

/// Message content: either plain text or a list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text.
    Text(String),
    /// Multi-part content.
    Parts(Vec<ContentPart>),
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking.
    pub role: Role,
    /// Message content. `None` when the model produced no content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Refusal text, set by providers that report refusals separately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

impl Message {
    /// Creates a message with the given role and text.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(Content::Text(content.into())),
            refusal: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a multi-part user message.
    #[must_use]
    pub const fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: Some(Content::Parts(parts)),
            refusal: None,
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates an assistant message with no content.
    #[must_use]
    pub const fn empty_assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            refusal: None,
        }
    }

    /// Returns the text of this message.
    ///
    /// Multi-part content is joined with newlines; image parts are skipped.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self.content.as_ref()? {
            Content::Text(text) => Some(text.clone()),
            Content::Parts(parts) => {
                let texts: Vec<&str> = parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => None,
                    })
                    .collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                }
            }
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::empty_assistant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_of_parts_skips_images() {
        let msg = Message::user_parts(vec![
            ContentPart::text("look at this"),
            ContentPart::image_url("https://example.com/a.png", Some(ImageDetail::Low)),
            ContentPart::text("and count"),
        ]);
        assert_eq!(msg.text().as_deref(), Some("look at this\nand count"));
    }

    #[test]
    fn test_empty_assistant_has_no_text() {
        assert_eq!(Message::empty_assistant().text(), None);
    }

    #[test]
    fn test_image_detail_from_str() {
        assert_eq!("HIGH".parse::<ImageDetail>(), Ok(ImageDetail::High));
        assert!("medium".parse::<ImageDetail>().is_err());
    }
}
