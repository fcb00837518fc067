//! Transaction branch management.
//!
//! This module provides the [`XaResource`] state machine and the
//! [`BranchRegistry`] it keeps its bookkeeping in.
//!
//! # Overview
//!
//! A transaction manager drives each branch through `start`, `end`,
//! `prepare` and `commit` (or `rollback` / `forget`). The registry records
//! which branches are active or suspended and which branch each caller
//! [`Session`] is currently bound to; the resource behind each branch comes
//! from the injected [`ResourceManager`](xabranch_resource::ResourceManager).
//!
//! # Example
//!
//! ```ignore
//! use xabranch::transaction::XaResource;
//!
//! let xa = XaResource::new(manager);
//!
//! // Work on a branch, suspend it, and resume it later
//! let session = xa.session();
//! session.start(&xid, StartFlags::NoFlags)?;
//! session.end(&xid, EndFlags::Suspend)?;
//! session.start(&xid, StartFlags::Resume)?;
//! session.end(&xid, EndFlags::Success)?;
//!
//! // One-phase optimization: prepare and commit in a single call
//! session.commit(&xid, true)?;
//! ```

mod registry;
mod resource;
mod session;


pub use registry::{Binding, BranchRegistry, Partition};
pub use resource::XaResource;
pub use session::{Session, SessionId};
