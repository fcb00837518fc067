//! Resource error types.

use thiserror::Error;
use xabranch_core::CoreError;

/// Errors that can occur in resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The underlying store could not be opened.
    #[error("failed to open resource store: {0}")]
    Open(String),

    /// The underlying store reported an error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A durable record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The operation is not legal in the branch's current state.
    #[error("invalid resource state: {0}")]
    State(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A core type could not be encoded or decoded.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ResourceError {
    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Returns `true` if the error reflects a caller sequencing mistake rather
    /// than a failure of the store.
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

/// A specialized `Result` type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
