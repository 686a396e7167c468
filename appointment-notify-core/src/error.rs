//! Error types for appointment notifications.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while composing or encoding a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource unavailable: {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<minijinja::Error> for NotifyError {
    fn from(err: minijinja::Error) -> Self {
        NotifyError::Render(err.to_string())
    }
}

/// Result type alias for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;
