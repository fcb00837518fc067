//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An encoding or decoding error occurred.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A validation error occurred.
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Create an encoding error.
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
