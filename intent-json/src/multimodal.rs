//! User content for an invocation: an image reference or plain text.
//!
//! Images are passed to the provider as URLs. Remote `http(s)` URLs are
//! forwarded untouched; local bytes are inlined as `data:` URLs.
//!
//! ```rust,ignore
//! let remote = ImageInput::from_url("https://example.com/fruit.jpg");
//! let inline = ImageInput::from_bytes(&png_bytes, None);
//! assert!(inline.is_inline());
//! ```

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::message::{ContentPart, ImageDetail};

/// Lead-in sent ahead of an image.
pub const IMAGE_LEAD_IN: &str =
    "Here is the image to analyze. Please operate as defined in the system message.";

/// Lead-in sent ahead of the user's text.
pub const TEXT_LEAD_IN: &str =
    "Here is the text to analyze. Please operate as defined in the system message.";

/// Image formats accepted for inline images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ImageFormat {
    /// PNG format (default).
    #[default]
    Png,
    /// JPEG format.
    Jpeg,
    /// GIF format.
    Gif,
    /// WebP format.
    Webp,
}

impl ImageFormat {
    /// Get the MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// Map a MIME type to a format.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Detect format from magic bytes (file signature).
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, 0x50, 0x4E, 0x47, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x47, 0x49, 0x46, 0x38, ..] => Some(Self::Gif),
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }
}

/// An image reference the provider can fetch or decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageInput {
    url: String,
}

impl ImageInput {
    /// Reference an image by URL (remote or `data:`). No request is made.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Inline raw image bytes as a base64 `data:` URL.
    ///
    /// The format is sniffed from the bytes when `None` is given, falling
    /// back to PNG.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], format: impl Into<Option<ImageFormat>>) -> Self {
        let format = format
            .into()
            .or_else(|| ImageFormat::from_magic_bytes(bytes))
            .unwrap_or_default();
        Self {
            url: format!("data:{};base64,{}", format.mime_type(), BASE64.encode(bytes)),
        }
    }

    /// The URL handed to the provider.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` for inline `data:` images.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

/// What the user asks the model to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UserContent {
    /// An image reference.
    Image(ImageInput),
    /// Free text.
    Text(String),
}

impl UserContent {
    /// Builds the user-message parts: a lead-in followed by the content.
    #[must_use]
    pub fn to_parts(&self, detail: ImageDetail) -> Vec<ContentPart> {
        match self {
            Self::Image(image) => vec![
                ContentPart::text(IMAGE_LEAD_IN),
                ContentPart::image_url(image.url(), Some(detail)),
            ],
            Self::Text(text) => vec![ContentPart::text(TEXT_LEAD_IN), ContentPart::text(text)],
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Text(_) => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_sniffs_format() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let image = ImageInput::from_bytes(&jpeg, None);
        assert!(image.url().starts_with("data:image/jpeg;base64,"));
        assert!(image.is_inline());

        let unknown = ImageInput::from_bytes(b"????", None);
        assert!(unknown.url().starts_with("data:image/png;base64,"));

        let forced = ImageInput::from_bytes(b"????", ImageFormat::Gif);
        assert_eq!(forced.url(), "data:image/gif;base64,Pz8/Pw==");
    }

    #[test]
    fn test_webp_magic() {
        let webp = *b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(ImageFormat::from_magic_bytes(&webp), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF"), None);
    }

    #[test]
    fn test_image_parts() {
        let content = UserContent::Image(ImageInput::from_url("https://example.com/a.jpg"));
        let parts = content.to_parts(ImageDetail::Low);
        assert_eq!(
            parts,
            vec![
                ContentPart::text(IMAGE_LEAD_IN),
                ContentPart::image_url("https://example.com/a.jpg", Some(ImageDetail::Low)),
            ]
        );
        assert!(!ImageInput::from_url("https://example.com/a.jpg").is_inline());
    }

    #[test]
    fn test_text_parts() {
        let content = UserContent::Text("I love it".to_owned());
        let parts = content.to_parts(ImageDetail::High);
        assert_eq!(
            parts,
            vec![ContentPart::text(TEXT_LEAD_IN), ContentPart::text("I love it")]
        );
        assert_eq!(content.kind(), "text");
    }
}
