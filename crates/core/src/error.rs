/// Result alias that carries the custom [`SequencerError`] type.
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// Free-form failure surfaced to the command line driver.
    #[error("{0}")]
    Message(String),
    /// A configuration value was rejected before it could reach the
    /// sequencer.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON configuration.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl SequencerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a configuration error that is reported before any stepping.
    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for SequencerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SequencerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
