//! `xabranch` Resources
//!
//! This crate defines the contract between the XA branch manager and the
//! transactional resources it drives, and ships a durable backend
//! implementing that contract.
//!
//! # Overview
//!
//! A branch manager never touches data itself. For every transaction branch it
//! asks a [`ResourceManager`] for a [`TransactionalResource`], then sequences
//! the resource through start, prepare and commit (or rollback). The resource
//! manager also answers the two identity questions the protocol needs: whether
//! two managers front the same underlying store, and which branches survived a
//! crash in the prepared state.
//!
//! # Core Traits
//!
//! - [`TransactionalResource`] - One branch's binding to the underlying data
//! - [`ResourceManager`] - Factory for resources plus RM identity and recovery
//!
//! # Error Handling
//!
//! All fallible operations return [`ResourceResult<T>`], an alias for
//! `Result<T, ResourceError>`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use xabranch_resource::backends::{LedgerEngine, LedgerResourceManager};
//! use xabranch_resource::{ResourceManager, TransactionalResource};
//!
//! let engine = Arc::new(LedgerEngine::open("ledger.redb")?);
//! let manager = LedgerResourceManager::new(Arc::clone(&engine));
//!
//! let branch = manager.create_resource(&xid)?;
//! branch.start_transaction()?;
//! branch.put(b"account:1", b"100")?;
//! assert!(branch.prepare_transaction()?);
//! branch.commit_transaction()?;
//!
//! assert_eq!(engine.get(b"account:1")?, Some(b"100".to_vec()));
//! ```
//!
//! # Modules
//!
//! - [`resource`] - Resource traits and error types
//! - [`backends`] - Concrete resource implementations

pub mod backends;
pub mod resource;

pub use resource::{ResourceError, ResourceManager, ResourceResult, TransactionalResource};
