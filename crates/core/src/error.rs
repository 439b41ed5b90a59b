use std::path::PathBuf;

/// Result alias that carries the custom [`LyricsError`] type.
pub type Result<T> = std::result::Result<T, LyricsError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    /// Free-form failure with a readable message.
    #[error("{0}")]
    Message(String),
    /// The requested lyrics file does not exist.
    #[error("lyrics file `{}` not found", path.display())]
    NotFound { path: PathBuf },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl LyricsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` when the error means "there was no file to read", as
    /// opposed to a failure while reading one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<&str> for LyricsError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LyricsError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
