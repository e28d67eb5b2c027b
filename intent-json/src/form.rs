//! Request validation for raw form fields.
//!
//! [`FormFields::validate`] is the gate in front of every provider call:
//! it either yields a well-typed [`InvocationRequest`] or a [`FieldErrors`]
//! map naming each missing field. It never touches the network and never
//! compiles the schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::multimodal::{ImageInput, UserContent};

/// Reported on `imageUrl` when the value is neither a web nor an inline image.
pub const UNSUPPORTED_IMAGE_URL: &str = "Image URL must be an http(s) or data:image URL.";

/// Form field names, serialized the way the form posts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    /// The image reference (image mode).
    ImageUrl,
    /// The text to analyze (text mode).
    UserText,
    /// The instruction.
    SystemPrompt,
    /// The schema-source.
    JsonSchema,
}

impl FieldName {
    /// The wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ImageUrl => "imageUrl",
            Self::UserText => "userText",
            Self::SystemPrompt => "systemPrompt",
            Self::JsonSchema => "jsonSchema",
        }
    }

    /// Message reported when the field is missing or blank.
    #[must_use]
    pub const fn empty_message(&self) -> &'static str {
        match self {
            Self::ImageUrl => "Image URL cannot be empty.",
            Self::UserText => "User text cannot be empty.",
            Self::SystemPrompt => "System prompt cannot be empty.",
            Self::JsonSchema => "JSON schema cannot be empty.",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable messages per failing field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldName, Vec<String>>);

impl FieldErrors {
    /// Record a message for `field`.
    pub fn add(&mut self, field: FieldName, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    /// Returns `true` if `field` has at least one message.
    #[must_use]
    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    /// Returns `true` if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over failing fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &[String])> {
        self.0.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

/// Which content field the form carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Analyze an image (`imageUrl`).
    #[default]
    Image,
    /// Analyze text (`userText`).
    Text,
}

/// Raw, possibly missing form values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    /// Which content field is required.
    #[serde(default)]
    pub mode: InputMode,
    /// Image reference, used in image mode.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Text to analyze, used in text mode.
    #[serde(default)]
    pub user_text: Option<String>,
    /// Instruction for the model.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Schema-source.
    #[serde(default)]
    pub json_schema: Option<String>,
}

impl FormFields {
    /// Fields for image analysis.
    #[must_use]
    pub fn image(
        image_url: impl Into<String>,
        system_prompt: impl Into<String>,
        json_schema: impl Into<String>,
    ) -> Self {
        Self {
            mode: InputMode::Image,
            image_url: Some(image_url.into()),
            user_text: None,
            system_prompt: Some(system_prompt.into()),
            json_schema: Some(json_schema.into()),
        }
    }

    /// Fields for text analysis.
    #[must_use]
    pub fn text(
        user_text: impl Into<String>,
        system_prompt: impl Into<String>,
        json_schema: impl Into<String>,
    ) -> Self {
        Self {
            mode: InputMode::Text,
            image_url: None,
            user_text: Some(user_text.into()),
            system_prompt: Some(system_prompt.into()),
            json_schema: Some(json_schema.into()),
        }
    }

    /// Checks that every required field is present and non-blank.
    ///
    /// All failing fields are reported together.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field fails.
    pub fn validate(&self) -> Result<InvocationRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let content = match self.mode {
            InputMode::Image => {
                match required(&mut errors, FieldName::ImageUrl, self.image_url.as_deref()) {
                    Some(url) if is_supported_image_url(url.trim()) => Some(UserContent::Image(
                        ImageInput::from_url(url.trim()),
                    )),
                    Some(_) => {
                        errors.add(FieldName::ImageUrl, UNSUPPORTED_IMAGE_URL);
                        None
                    }
                    None => None,
                }
            }
            InputMode::Text => {
                required(&mut errors, FieldName::UserText, self.user_text.as_deref())
                    .map(|text| UserContent::Text(text.to_owned()))
            }
        };
        let instruction = required(
            &mut errors,
            FieldName::SystemPrompt,
            self.system_prompt.as_deref(),
        );
        let schema_source = required(&mut errors, FieldName::JsonSchema, self.json_schema.as_deref());

        match (content, instruction, schema_source) {
            (Some(content), Some(instruction), Some(schema_source)) if errors.is_empty() => {
                Ok(InvocationRequest {
                    content,
                    instruction: instruction.to_owned(),
                    schema_source: schema_source.to_owned(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: FieldName,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, field.empty_message());
            None
        }
    }
}

fn is_supported_image_url(value: &str) -> bool {
    if value
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/"))
    {
        return true;
    }
    url::Url::parse(value)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// A validated request, ready for the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// What to analyze.
    pub content: UserContent,
    /// How the model should behave.
    pub instruction: String,
    /// The expected output shape.
    pub schema_source: String,
}

impl InvocationRequest {
    /// Build a request directly, bypassing form validation.
    #[must_use]
    pub fn new(
        content: UserContent,
        instruction: impl Into<String>,
        schema_source: impl Into<String>,
    ) -> Self {
        Self {
            content,
            instruction: instruction.into(),
            schema_source: schema_source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_image_form() {
        let request = FormFields::image(" https://example.com/a.jpg ", "count fruit", "z.object({})")
            .validate()
            .unwrap();
        assert_eq!(
            request.content,
            UserContent::Image(ImageInput::from_url("https://example.com/a.jpg"))
        );
        assert_eq!(request.instruction, "count fruit");
        assert_eq!(request.schema_source, "z.object({})");
    }

    #[test]
    fn test_each_empty_field_is_reported() {
        let cases = [
            (FormFields::image("", "p", "s"), FieldName::ImageUrl),
            (FormFields::image("https://a.b/c.png", "", "s"), FieldName::SystemPrompt),
            (FormFields::image("https://a.b/c.png", "p", "   "), FieldName::JsonSchema),
            (FormFields::text("\n\t", "p", "s"), FieldName::UserText),
        ];

        for (fields, field) in cases {
            let errors = fields.validate().unwrap_err();
            assert_eq!(errors.len(), 1, "{field}");
            assert_eq!(errors.get(field), Some(&[field.empty_message().to_owned()][..]));
        }
    }

    #[test]
    fn test_all_failures_reported_together() {
        let errors = FormFields {
            mode: InputMode::Text,
            ..FormFields::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(FieldName::UserText));
        assert!(errors.contains(FieldName::SystemPrompt));
        assert!(errors.contains(FieldName::JsonSchema));
        assert_eq!(
            errors.to_string(),
            "userText: User text cannot be empty.; systemPrompt: System prompt cannot be empty.; jsonSchema: JSON schema cannot be empty."
        );
    }

    #[test]
    fn test_image_url_scheme() {
        for ok in [
            "http://example.com/x.png",
            "https://example.com/x.png",
            "data:image/png;base64,AAAA",
            "DATA:IMAGE/jpeg;base64,AAAA",
        ] {
            assert!(FormFields::image(ok, "p", "s").validate().is_ok(), "{ok}");
        }

        for bad in ["file:///etc/passwd", "ftp://example.com/x.png", "not a url", "data:text/plain,hi"] {
            let errors = FormFields::image(bad, "p", "s").validate().unwrap_err();
            assert_eq!(
                errors.get(FieldName::ImageUrl),
                Some(&[UNSUPPORTED_IMAGE_URL.to_owned()][..]),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_field_errors_serialize_camel_case() {
        let errors = FormFields::image("https://a.b/c.png", "", "")
            .validate()
            .unwrap_err();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({
                "systemPrompt": ["System prompt cannot be empty."],
                "jsonSchema": ["JSON schema cannot be empty."]
            })
        );
    }

    #[test]
    fn test_deserialize_form_post() {
        let fields: FormFields = serde_json::from_str(
            r#"{ "mode": "text", "userText": "hi", "systemPrompt": "p", "jsonSchema": "s" }"#,
        )
        .unwrap();
        assert_eq!(fields, FormFields::text("hi", "p", "s"));
    }
}
