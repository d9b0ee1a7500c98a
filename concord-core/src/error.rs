//! Error types for concord-core.

use thiserror::Error;

/// Result type for concord-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for concord-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Offsets that cannot form a position (e.g. `begin > end`).
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// A sequence that must be sorted by position is not.
    #[error("Unordered input: {0}")]
    UnorderedInput(String),

    /// An annotation id that does not exist in the document.
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid position error.
    #[must_use]
    pub fn invalid_position(msg: impl Into<String>) -> Self {
        Self::InvalidPosition(msg.into())
    }

    /// Create an unordered input error.
    #[must_use]
    pub fn unordered_input(msg: impl Into<String>) -> Self {
        Self::UnorderedInput(msg.into())
    }

    /// Create an unknown annotation error.
    #[must_use]
    pub fn unknown_annotation(msg: impl Into<String>) -> Self {
        Self::UnknownAnnotation(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
