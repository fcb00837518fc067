//! Ledger resource backend.
//!
//! This module provides a durable [`TransactionalResource`](crate::TransactionalResource)
//! implementation using redb, a pure-Rust embedded database. Each branch
//! buffers its writes in memory; prepare persists the write set as a prepare
//! record, and commit applies it to the data table while removing the record
//! in a single redb transaction.
//!
//! # Features
//!
//! - **Read-your-writes**: a branch sees its own pending writes before commit
//! - **Durable prepare**: prepared branches survive a restart and are reported
//!   by [`recover`](crate::ResourceManager::recover)
//! - **Read-only detection**: a branch with no writes prepares without
//!   touching the disk
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xabranch_resource::backends::ledger::{LedgerEngine, LedgerResourceManager};
//! use xabranch_resource::{ResourceManager, TransactionalResource};
//!
//! let engine = Arc::new(LedgerEngine::open("ledger.redb")?);
//! let rm = LedgerResourceManager::new(Arc::clone(&engine));
//!
//! let branch = rm.create_resource(&xid)?;
//! branch.start_transaction()?;
//! branch.put(b"user:1".to_vec(), b"Alice".to_vec())?;
//! assert!(branch.prepare_transaction()?);
//! branch.commit_transaction()?;
//!
//! assert_eq!(engine.get(b"user:1")?, Some(b"Alice".to_vec()));
//! ```
//!
//! # In-Memory Ledgers
//!
//! For testing, you can create an in-memory ledger that doesn't persist:
//!
//! ```ignore
//! let engine = LedgerEngine::in_memory()?;
//! ```

mod branch;
pub mod buffer;
mod engine;
mod manager;
pub mod tables;

pub use branch::{BranchStatus, LedgerBranch};
pub use engine::{LedgerConfig, LedgerEngine, STORE_EXTENSION};
pub use manager::LedgerResourceManager;
