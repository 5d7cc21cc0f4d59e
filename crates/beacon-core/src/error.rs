//! Error types for the beacon system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for beacon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the beacon system
#[derive(Error, Debug)]
pub enum Error {
    /// Interface enumeration errors (interface gone, enumeration failed)
    #[error("interface error: {0}")]
    Interface(String),

    /// Unknown or malformed service template referenced by settings
    #[error("invalid service template: {0}")]
    InvalidTemplate(String),

    /// The advertisement backend rejected a registration
    #[error("registration failed: {0}")]
    Registration(String),

    /// The advertisement backend rejected an unregistration
    #[error("unregistration failed: {0}")]
    Unregistration(String),

    /// Settings could not be loaded or persisted
    #[error("settings error: {0}")]
    Settings(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A backend call exceeded its deadline
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// I/O errors (settings files, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific error
    #[error("backend error ({backend}): {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an interface error
    pub fn interface(msg: impl Into<String>) -> Self {
        Self::Interface(msg.into())
    }

    /// Create an invalid-template error
    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    /// Create a registration error
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Create an unregistration error
    pub fn unregistration(msg: impl Into<String>) -> Self {
        Self::Unregistration(msg.into())
    }

    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
