//! CLI error type.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that stop the CLI before or after an invocation.
///
/// Invocation failures themselves are not errors here: they are printed
/// as part of the playground state.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be used.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// An input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// A command-line argument is unusable.
    #[error("{0}")]
    Input(String),

    /// Output could not be rendered.
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// Create an input error.
    #[must_use]
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }
}
