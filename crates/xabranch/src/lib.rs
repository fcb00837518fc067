//! `xabranch` - XA Resource-Manager Branch Tracking
//!
//! This crate implements the resource-manager side of the X/Open XA
//! two-phase-commit protocol: it tracks the transaction branches an external
//! transaction manager starts on this resource manager and sequences each
//! branch's transactional resource through prepare and commit.
//!
//! # Features
//!
//! - **Branch registry**: active and suspended branches plus a per-session
//!   current-branch slot
//! - **Protocol state machine**: `start`, `end`, `prepare`, `commit`,
//!   `rollback` and `forget` with X/Open error semantics
//! - **Explicit sessions**: callers identify themselves with a [`SessionId`]
//!   instead of relying on thread identity
//! - **Recovery**: branches left prepared by a crash are listed and reattached
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use xabranch::{EndFlags, PrepareOutcome, StartFlags, XaResource, Xid};
//! use xabranch_resource::backends::{LedgerEngine, LedgerResourceManager};
//!
//! let engine = Arc::new(LedgerEngine::open("orders.redb")?);
//! let xa = XaResource::new(LedgerResourceManager::new(engine));
//!
//! let xid = Xid::new(0x1234, b"order-42".to_vec(), b"orders".to_vec())?;
//! let session = xa.session();
//! session.start(&xid, StartFlags::NoFlags)?;
//! session.resource()?.expect("bound").put(b"order:42", b"placed")?;
//! session.end(&xid, EndFlags::Success)?;
//!
//! assert_eq!(session.prepare(&xid)?, PrepareOutcome::Ok);
//! session.commit(&xid, false)?;
//! ```
//!
//! # Recovery
//!
//! After a restart, the transaction manager asks for in-doubt branches and
//! finishes them from any session:
//!
//! ```ignore
//! let xa = XaResource::new(LedgerResourceManager::new(engine));
//! let session = xa.session();
//! for xid in xa.recover(RecoverFlags::FULL_SCAN)? {
//!     session.commit(&xid, false)?;
//! }
//! ```
//!
//! # Modules
//!
//! - [`transaction`] - Branch registry, sessions and the XA state machine
//! - [`config`] - Configuration ([`XaConfig`])
//! - [`error`] - Error types ([`XaError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod transaction;

pub use config::{UnbindPolicy, XaConfig};
pub use error::{XaError, XaErrorKind, XaResult};
pub use transaction::{BranchRegistry, Partition, Session, SessionId, XaResource};

// Re-export the protocol vocabulary so callers need a single dependency
pub use xabranch_core::{EndFlags, PrepareOutcome, RecoverFlags, StartFlags, XaCode, Xid};
pub use xabranch_resource::{ResourceError, ResourceManager, TransactionalResource};
