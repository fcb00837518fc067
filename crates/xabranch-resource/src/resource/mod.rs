//! Transactional resource traits and abstractions.
//!
//! This module defines the traits that resource backends must implement:
//!
//! - [`TransactionalResource`] - Per-branch start/prepare/commit/rollback
//! - [`ResourceManager`] - Resource factory, RM identity and recovery listing
//!
//! # Error Handling
//!
//! Fallible operations return [`ResourceResult<T>`] which is an alias for
//! `Result<T, ResourceError>`. See [`ResourceError`] for the possible variants.

mod error;
mod traits;

pub use error::{ResourceError, ResourceResult};
pub use traits::{ResourceManager, TransactionalResource};
