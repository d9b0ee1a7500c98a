//! Error types for concord.

use thiserror::Error;

/// Result type for concord operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for concord operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the core types (positions, annotation store).
    #[error(transparent)]
    Core(#[from] concord_core::Error),

    /// A layer was requested for which no diff adapter is registered.
    #[error("No diff adapter for layer: {0}")]
    MissingAdapter(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Agreement calculation error.
    #[error("Agreement error: {0}")]
    Agreement(String),

    /// Index registry error.
    #[error("Registry error: {0}")]
    Registry(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a missing adapter error.
    pub fn missing_adapter(layer: impl Into<String>) -> Self {
        Error::MissingAdapter(layer.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an agreement error.
    pub fn agreement(msg: impl Into<String>) -> Self {
        Error::Agreement(msg.into())
    }

    /// Create a registry error.
    pub fn registry(msg: impl Into<String>) -> Self {
        Error::Registry(msg.into())
    }
}
