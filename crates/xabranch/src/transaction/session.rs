//! Caller sessions.
//!
//! A session is the explicit caller context the branch manager keys its
//! "current branch" slot on. Each thread (or task, or connection) driving
//! branches opens its own session; two sessions never observe each other's
//! binding.
//!
//! # Example
//!
//! ```ignore
//! let session = xa.session();
//! session.start(&xid, StartFlags::NoFlags)?;
//! // ... work through session.resource() ...
//! session.end(&xid, EndFlags::Success)?;
//! session.prepare(&xid)?;
//! session.commit(&xid, false)?;
//! // The session's slot is released when `session` is dropped
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::warn;
use xabranch_core::{EndFlags, PrepareOutcome, StartFlags, Xid};
use xabranch_resource::ResourceManager;

use crate::error::XaResult;

use super::resource::XaResource;

/// Identifies one caller of an [`XaResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a session id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A borrowed session handle.
///
/// Forwards the branch lifecycle operations with its own [`SessionId`] and
/// closes the session when dropped.
pub struct Session<'a, M: ResourceManager> {
    xa: &'a XaResource<M>,
    id: SessionId,
}

impl<'a, M: ResourceManager> Session<'a, M> {
    pub(crate) const fn new(xa: &'a XaResource<M>, id: SessionId) -> Self {
        Self { xa, id }
    }

    /// This session's id.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// See [`XaResource::start`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::start`].
    pub fn start(&self, xid: &Xid, flags: StartFlags) -> XaResult<()> {
        self.xa.start(self.id, xid, flags)
    }

    /// See [`XaResource::end`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::end`].
    pub fn end(&self, xid: &Xid, flags: EndFlags) -> XaResult<()> {
        self.xa.end(self.id, xid, flags)
    }

    /// See [`XaResource::prepare`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::prepare`].
    pub fn prepare(&self, xid: &Xid) -> XaResult<PrepareOutcome> {
        self.xa.prepare(self.id, xid)
    }

    /// See [`XaResource::commit`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::commit`].
    pub fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()> {
        self.xa.commit(self.id, xid, one_phase)
    }

    /// See [`XaResource::rollback`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::rollback`].
    pub fn rollback(&self, xid: &Xid) -> XaResult<()> {
        self.xa.rollback(self.id, xid)
    }

    /// See [`XaResource::forget`].
    ///
    /// # Errors
    ///
    /// See [`XaResource::forget`].
    pub fn forget(&self, xid: &Xid) -> XaResult<()> {
        self.xa.forget(self.id, xid)
    }

    /// The branch this session is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`](crate::XaError::LockPoisoned) if the
    /// registry lock is poisoned.
    pub fn current(&self) -> XaResult<Option<Xid>> {
        self.xa.current(self.id)
    }

    /// The resource of the branch this session is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`](crate::XaError::LockPoisoned) if the
    /// registry lock is poisoned.
    pub fn resource(&self) -> XaResult<Option<Arc<M::Resource>>> {
        self.xa.resource(self.id)
    }
}

impl<M: ResourceManager> Drop for Session<'_, M> {
    fn drop(&mut self) {
        if let Err(e) = self.xa.close_session(self.id) {
            warn!(session = %self.id, error = %e, "failed to close session");
        }
    }
}

impl<M: ResourceManager> fmt::Debug for Session<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish_non_exhaustive()
    }
}
