//! Error types for the XA branch manager.
//!
//! This module provides the [`XaError`] type that represents all possible
//! failures of the branch lifecycle operations, and [`XaErrorKind`], a
//! field-less discriminant for matching.

use thiserror::Error;
use xabranch_core::{XaCode, Xid};
use xabranch_resource::ResourceError;

/// Errors reported by the XA branch manager.
#[derive(Debug, Error)]
pub enum XaError {
    /// The branch is not tracked (or, for `end`, not active).
    #[error("no such transaction branch: {0}")]
    NoTransaction(Xid),

    /// The caller's binding does not allow the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The branch must roll back.
    #[error("transaction branch {0} is rollback-only")]
    RollbackOnly(Xid),

    /// The operation is out of protocol order.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The resource for a new branch could not be created or started.
    #[error("failed to start transaction branch {xid}: {source}")]
    StartFailure {
        /// The branch that failed to start.
        xid: Xid,
        /// The underlying cause.
        source: ResourceError,
    },

    /// The resource failed while preparing, committing, rolling back or
    /// recovering.
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// An internal lock was poisoned (a thread panicked while holding it).
    #[error("internal lock poisoned: {0}")]
    LockPoisoned(String),
}

/// The kind of an [`XaError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XaErrorKind {
    /// See [`XaError::NoTransaction`].
    NoTransaction,
    /// See [`XaError::InvalidState`].
    InvalidState,
    /// See [`XaError::RollbackOnly`].
    RollbackOnly,
    /// See [`XaError::ProtocolViolation`].
    ProtocolViolation,
    /// See [`XaError::StartFailure`].
    StartFailure,
    /// See [`XaError::Resource`].
    Resource,
    /// See [`XaError::LockPoisoned`].
    LockPoisoned,
}

impl XaError {
    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a protocol violation error.
    #[must_use]
    pub fn protocol_violation(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Create a lock poisoned error.
    #[must_use]
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }

    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> XaErrorKind {
        match self {
            Self::NoTransaction(_) => XaErrorKind::NoTransaction,
            Self::InvalidState(_) => XaErrorKind::InvalidState,
            Self::RollbackOnly(_) => XaErrorKind::RollbackOnly,
            Self::ProtocolViolation(_) => XaErrorKind::ProtocolViolation,
            Self::StartFailure { .. } => XaErrorKind::StartFailure,
            Self::Resource(_) => XaErrorKind::Resource,
            Self::LockPoisoned(_) => XaErrorKind::LockPoisoned,
        }
    }

    /// The X/Open return code a transaction manager expects for this error.
    #[must_use]
    pub const fn code(&self) -> XaCode {
        match self {
            Self::NoTransaction(_) => XaCode::NoTransaction,
            Self::InvalidState(_) => XaCode::InvalidState,
            Self::RollbackOnly(_) => XaCode::RollbackOnly,
            Self::ProtocolViolation(_) => XaCode::ProtocolViolation,
            Self::StartFailure { .. } | Self::Resource(_) | Self::LockPoisoned(_) => {
                XaCode::ResourceError
            }
        }
    }

    /// Returns `true` if the transaction manager must drive a global rollback.
    #[must_use]
    pub const fn is_rollback(&self) -> bool {
        matches!(self, Self::RollbackOnly(_))
    }

    /// Returns `true` if the branch was unknown.
    #[must_use]
    pub const fn is_no_transaction(&self) -> bool {
        matches!(self, Self::NoTransaction(_))
    }
}

/// A specialized `Result` type for XA operations.
pub type XaResult<T> = std::result::Result<T, XaError>;
