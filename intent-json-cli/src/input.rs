//! Reading prompts, schemas and images from arguments or files.

use std::path::Path;

use intent_json::multimodal::{ImageFormat, ImageInput};

use crate::error::{CliError, Result};

/// Read a whole file as UTF-8 text.
pub async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Pick an inline value or a file's contents, whichever was given.
pub async fn text_or_file(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => read_text(path).await.map(Some),
        (None, None) => Ok(None),
    }
}

/// Load a local image and inline it as a `data:` URL.
///
/// The format comes from the file signature, then the extension.
pub async fn load_image(path: &Path) -> Result<ImageInput> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let format = ImageFormat::from_magic_bytes(&bytes).or_else(|| {
        mime_guess::from_path(path)
            .first_raw()
            .and_then(ImageFormat::from_mime)
    });
    let Some(format) = format else {
        return Err(CliError::input(format!(
            "{} is not a PNG, JPEG, GIF or WebP image",
            path.display()
        )));
    };

    tracing::debug!(path = %path.display(), bytes = bytes.len(), format = format.mime_type(), "inlined image");
    Ok(ImageInput::from_bytes(&bytes, format))
}
