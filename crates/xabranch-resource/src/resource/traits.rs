//! Core resource traits.
//!
//! This module defines the two contracts a branch manager consumes:
//!
//! - [`TransactionalResource`] - One branch's view of the underlying data
//! - [`ResourceManager`] - Creates resources and answers RM-identity questions
//!
//! Resources are shared between the branch registry and whichever caller is
//! currently bound to the branch, so every method takes `&self`; a resource
//! keeps its mutable state behind its own synchronization.

use std::sync::Arc;

use xabranch_core::{RecoverFlags, Xid};

use super::ResourceResult;

/// One transaction branch's binding to an underlying data resource.
///
/// The branch manager calls these methods in protocol order and never
/// concurrently for the same branch:
///
/// ```text
/// start_transaction ─► [mark_transaction_for_rollback] ─► prepare_transaction ─► commit_transaction
///                                                                           └──► rollback_transaction
/// ```
///
/// `rollback_transaction` is legal from any non-terminal state.
pub trait TransactionalResource: Send + Sync {
    /// Begin the branch's work.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot begin a transaction.
    fn start_transaction(&self) -> ResourceResult<()>;

    /// Vote on the outcome of the branch.
    ///
    /// Returns `Ok(true)` if the branch is prepared and can be committed,
    /// `Ok(false)` if it must roll back.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource fails while preparing.
    fn prepare_transaction(&self) -> ResourceResult<bool>;

    /// Make the branch's changes permanent.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit_transaction(&self) -> ResourceResult<()>;

    /// Discard the branch's changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    fn rollback_transaction(&self) -> ResourceResult<()>;

    /// Mark the branch so that it can only roll back.
    fn mark_transaction_for_rollback(&self);

    /// Returns `true` if the branch has been marked rollback-only.
    fn is_transaction_marked_for_rollback(&self) -> bool;

    /// Returns `true` if the branch has been prepared.
    fn is_transaction_prepared(&self) -> bool;

    /// Returns `true` if the branch made no changes.
    fn is_read_only_transaction(&self) -> bool;
}

/// A resource manager: the factory and identity behind a family of resources.
///
/// Implementations must be thread-safe (`Send + Sync`); a single manager serves
/// every branch and every caller of one branch manager.
pub trait ResourceManager: Send + Sync {
    /// The resource type produced for each branch.
    type Resource: TransactionalResource;

    /// Create a new resource bound to `xid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be created.
    fn create_resource(&self, xid: &Xid) -> ResourceResult<Self::Resource>;

    /// Returns `true` if `other` fronts the same underlying resource manager.
    fn is_same_rm(&self, other: &Self) -> bool;

    /// List the branches this resource manager holds in the prepared state.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable branch records cannot be read.
    fn recover(&self, flags: RecoverFlags) -> ResourceResult<Vec<Xid>>;

    /// Rebuild the resource of a branch reported by [`recover`](Self::recover).
    ///
    /// Returns `Ok(None)` if the branch cannot be reattached. The default
    /// implementation never reattaches.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch's durable record cannot be read.
    fn reattach(&self, xid: &Xid) -> ResourceResult<Option<Self::Resource>> {
        let _ = xid;
        Ok(None)
    }
}

// ============================================================================
// Blanket Implementations
// ============================================================================

/// Implement `ResourceManager` for `Arc<M>` so several branch managers can
/// share one resource manager.
impl<M: ResourceManager> ResourceManager for Arc<M> {
    type Resource = M::Resource;

    fn create_resource(&self, xid: &Xid) -> ResourceResult<Self::Resource> {
        (**self).create_resource(xid)
    }

    fn is_same_rm(&self, other: &Self) -> bool {
        (**self).is_same_rm(other)
    }

    fn recover(&self, flags: RecoverFlags) -> ResourceResult<Vec<Xid>> {
        (**self).recover(flags)
    }

    fn reattach(&self, xid: &Xid) -> ResourceResult<Option<Self::Resource>> {
        (**self).reattach(xid)
    }
}
