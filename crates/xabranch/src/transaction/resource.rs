//! The XA protocol state machine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use xabranch_core::{EndFlags, PrepareOutcome, RecoverFlags, StartFlags, Xid};
use xabranch_resource::{ResourceManager, TransactionalResource};

use crate::config::{UnbindPolicy, XaConfig};
use crate::error::{XaError, XaResult};

use super::registry::{Binding, BranchRegistry, Partition};
use super::session::{Session, SessionId};

/// The resource-manager side of the XA two-phase-commit protocol.
///
/// `XaResource` tracks every branch a transaction manager has started on
/// this resource manager and sequences the branch's
/// [`TransactionalResource`] through the protocol. Branch state is derived
/// from the registry:
///
/// ```text
///              start                      end(Suspend)
/// (absent) ───────────► Active ◄───────────────────────► Suspended
///    ▲                    │        start(Resume)
///    │                    │ prepare (Ok)
///    │                    ▼
///    └──────────── Active (prepared)
///      commit / rollback / forget, or prepare (ReadOnly)
/// ```
///
/// Every operation takes the calling [`SessionId`]; a session is bound to
/// at most one branch at a time.
///
/// # Thread Safety
///
/// `XaResource` is `Send + Sync` when its manager is, and can be shared
/// across threads by reference or with `Arc<XaResource<M>>`. Callers must not
/// issue overlapping calls for the same branch.
///
/// # Example
///
/// ```ignore
/// use xabranch::{XaResource, StartFlags, EndFlags, PrepareOutcome};
///
/// let xa = XaResource::new(manager);
/// let session = xa.open_session();
///
/// xa.start(session, &xid, StartFlags::NoFlags)?;
/// xa.end(session, &xid, EndFlags::Success)?;
/// if xa.prepare(session, &xid)? == PrepareOutcome::Ok {
///     xa.commit(session, &xid, false)?;
/// }
/// ```
pub struct XaResource<M: ResourceManager> {
    manager: M,
    config: XaConfig,
    registry: BranchRegistry<M::Resource>,
    next_session: AtomicU64,
}

impl<M: ResourceManager> XaResource<M> {
    /// Create a branch manager over `manager` with the default configuration.
    pub fn new(manager: M) -> Self {
        Self::with_config(manager, XaConfig::default())
    }

    /// Create a branch manager over `manager` with custom configuration.
    pub fn with_config(manager: M, config: XaConfig) -> Self {
        Self { manager, config, registry: BranchRegistry::new(), next_session: AtomicU64::new(1) }
    }

    /// The injected resource manager.
    #[must_use]
    pub const fn manager(&self) -> &M {
        &self.manager
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &XaConfig {
        &self.config
    }

    /// The branch registry.
    #[must_use]
    pub const fn registry(&self) -> &BranchRegistry<M::Resource> {
        &self.registry
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Issue a fresh session id.
    pub fn open_session(&self) -> SessionId {
        SessionId::new(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    /// Open a session wrapped in a handle that closes it on drop.
    pub fn session(&self) -> Session<'_, M> {
        Session::new(self, self.open_session())
    }

    /// Clear `session`'s slot.
    ///
    /// The branch it was bound to, if any, stays tracked.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the registry lock is poisoned.
    pub fn close_session(&self, session: SessionId) -> XaResult<()> {
        if let Some(binding) = self.registry.set_current(session, None)? {
            debug!(rm = %self.config.name, %session, xid = %binding.xid(), "closed bound session");
        }
        Ok(())
    }

    /// The branch `session` is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the registry lock is poisoned.
    pub fn current(&self, session: SessionId) -> XaResult<Option<Xid>> {
        Ok(self.registry.current(session)?.map(|binding| binding.xid().clone()))
    }

    /// The resource of the branch `session` is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the registry lock is poisoned.
    pub fn resource(&self, session: SessionId) -> XaResult<Option<Arc<M::Resource>>> {
        Ok(self.registry.current(session)?.map(|binding| Arc::clone(binding.resource())))
    }

    /// The resource of a tracked branch.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the registry lock is poisoned.
    pub fn branch(&self, xid: &Xid) -> XaResult<Option<Arc<M::Resource>>> {
        self.registry.lookup(xid)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Associate `session` with branch `xid`.
    ///
    /// With [`StartFlags::NoFlags`] or [`StartFlags::Join`] a new resource is
    /// created and started. With [`StartFlags::Resume`] the suspended
    /// branch's resource is reused without being started again.
    ///
    /// # Errors
    ///
    /// - [`XaError::InvalidState`] if `session` is already bound to a branch
    /// - [`XaError::NoTransaction`] if resuming a branch that is not suspended
    /// - [`XaError::StartFailure`] if the resource cannot be created or started;
    ///   nothing is registered in that case
    pub fn start(&self, session: SessionId, xid: &Xid, flags: StartFlags) -> XaResult<()> {
        debug!(rm = %self.config.name, %session, %xid, %flags, "start");

        if let Some(bound) = self.registry.current(session)? {
            return Err(XaError::invalid_state(format!(
                "{session} is already bound to branch {}",
                bound.xid()
            )));
        }

        let resource = match flags {
            StartFlags::NoFlags | StartFlags::Join => {
                let resource = Arc::new(self.create_and_start(xid)?);
                self.registry.put_active(xid.clone(), Arc::clone(&resource))?;
                resource
            }
            StartFlags::Resume => self
                .registry
                .transition(xid, Partition::Suspended, Partition::Active)?
                .ok_or_else(|| XaError::NoTransaction(xid.clone()))?,
        };

        self.registry.set_current(session, Some(Binding::new(xid.clone(), resource)))?;
        Ok(())
    }

    fn create_and_start(&self, xid: &Xid) -> XaResult<M::Resource> {
        let started = self.manager.create_resource(xid).and_then(|resource| {
            resource.start_transaction()?;
            Ok(resource)
        });

        started.map_err(|source| {
            error!(rm = %self.config.name, %xid, error = %source, "failed to start branch");
            XaError::StartFailure { xid: xid.clone(), source }
        })
    }

    /// Dissociate the caller from branch `xid`.
    ///
    /// [`EndFlags::Suspend`] moves the branch to the suspended partition
    /// without notifying its resource. [`EndFlags::Fail`] marks the resource
    /// rollback-only. The caller's slot is cleared in every case.
    ///
    /// # Errors
    ///
    /// - [`XaError::NoTransaction`] if `xid` is not active
    /// - [`XaError::InvalidState`] if `session` is not bound to a branch
    pub fn end(&self, session: SessionId, xid: &Xid, flags: EndFlags) -> XaResult<()> {
        debug!(rm = %self.config.name, %session, %xid, %flags, "end");

        let resource =
            self.registry.lookup_active(xid)?.ok_or_else(|| XaError::NoTransaction(xid.clone()))?;

        if self.registry.current(session)?.is_none() {
            return Err(XaError::invalid_state(format!("{session} is not bound to a branch")));
        }

        match flags {
            EndFlags::Suspend => {
                self.registry.transition(xid, Partition::Active, Partition::Suspended)?;
            }
            EndFlags::Fail => resource.mark_transaction_for_rollback(),
            EndFlags::Success => {}
        }

        self.registry.set_current(session, None)?;
        Ok(())
    }

    /// Ask branch `xid` to prepare.
    ///
    /// A read-only branch has nothing to commit: it is committed right away
    /// and untracked, and [`PrepareOutcome::ReadOnly`] is returned.
    ///
    /// # Errors
    ///
    /// - [`XaError::NoTransaction`] if `xid` is not tracked
    /// - [`XaError::RollbackOnly`] if the branch is marked for rollback or its
    ///   resource votes no
    /// - [`XaError::Resource`] if the resource fails; the branch stays tracked
    pub fn prepare(&self, session: SessionId, xid: &Xid) -> XaResult<PrepareOutcome> {
        debug!(rm = %self.config.name, %session, %xid, "prepare");

        let resource = self.tracked(xid)?;
        if resource.is_transaction_marked_for_rollback() {
            return Err(XaError::RollbackOnly(xid.clone()));
        }

        if !resource.prepare_transaction()? {
            return Err(XaError::RollbackOnly(xid.clone()));
        }

        if resource.is_read_only_transaction() {
            debug!(rm = %self.config.name, %xid, "read-only branch, committing");
            self.commit(session, xid, true)?;
            return Ok(PrepareOutcome::ReadOnly);
        }
        Ok(PrepareOutcome::Ok)
    }

    /// Commit branch `xid`.
    ///
    /// With `one_phase` an unprepared branch is prepared first.
    ///
    /// # Errors
    ///
    /// - [`XaError::NoTransaction`] if `xid` is not tracked
    /// - [`XaError::RollbackOnly`] if the branch is marked for rollback, or the
    ///   implicit prepare votes no
    /// - [`XaError::ProtocolViolation`] for a two-phase commit of an unprepared
    ///   branch
    /// - [`XaError::Resource`] if the resource fails; the branch stays tracked
    pub fn commit(&self, session: SessionId, xid: &Xid, one_phase: bool) -> XaResult<()> {
        debug!(rm = %self.config.name, %session, %xid, one_phase, "commit");

        let resource = self.tracked(xid)?;
        if resource.is_transaction_marked_for_rollback() {
            return Err(XaError::RollbackOnly(xid.clone()));
        }

        if !resource.is_transaction_prepared() {
            if !one_phase {
                return Err(XaError::protocol_violation(format!(
                    "two-phase commit of unprepared branch {xid}"
                )));
            }
            if !resource.prepare_transaction()? {
                return Err(XaError::RollbackOnly(xid.clone()));
            }
        }

        resource.commit_transaction()?;
        self.complete(session, xid)
    }

    /// Roll back branch `xid`. Legal in any state.
    ///
    /// # Errors
    ///
    /// - [`XaError::NoTransaction`] if `xid` is not tracked
    /// - [`XaError::Resource`] if the resource fails; the branch stays tracked
    pub fn rollback(&self, session: SessionId, xid: &Xid) -> XaResult<()> {
        debug!(rm = %self.config.name, %session, %xid, "rollback");

        self.tracked(xid)?.rollback_transaction()?;
        self.complete(session, xid)
    }

    /// Discard branch `xid` without calling its resource.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::NoTransaction`] if `xid` is not tracked.
    pub fn forget(&self, session: SessionId, xid: &Xid) -> XaResult<()> {
        debug!(rm = %self.config.name, %session, %xid, "forget");

        self.tracked(xid)?;
        self.complete(session, xid)
    }

    fn tracked(&self, xid: &Xid) -> XaResult<Arc<M::Resource>> {
        self.registry.lookup(xid)?.ok_or_else(|| XaError::NoTransaction(xid.clone()))
    }

    /// Clear the caller's slot and untrack a finished branch.
    fn complete(&self, session: SessionId, xid: &Xid) -> XaResult<()> {
        self.registry.set_current(session, None)?;
        if self.config.unbind_policy == UnbindPolicy::AllSessions {
            let released = self.registry.release(xid)?;
            if released > 0 {
                debug!(rm = %self.config.name, %xid, released, "released other sessions");
            }
        }
        self.registry.remove(xid)?;
        Ok(())
    }

    // ========================================================================
    // Identity and recovery
    // ========================================================================

    /// Returns `true` if `other` fronts the same resource manager.
    pub fn is_same_rm(&self, other: &Self) -> bool {
        self.manager.is_same_rm(&other.manager)
    }

    /// List the branches the resource manager holds prepared.
    ///
    /// Each listed branch not already tracked is reattached through
    /// [`ResourceManager::reattach`] and tracked as active with no session
    /// bound, so the transaction manager can commit or roll it back.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::Resource`] if the resource manager cannot list its
    /// branches. A branch that fails to reattach is logged and still listed.
    pub fn recover(&self, flags: RecoverFlags) -> XaResult<Vec<Xid>> {
        debug!(rm = %self.config.name, flags = flags.raw(), "recover");

        let xids = self.manager.recover(flags)?;
        for xid in &xids {
            if self.registry.lookup(xid)?.is_some() {
                continue;
            }
            match self.manager.reattach(xid) {
                Ok(Some(resource)) => {
                    self.registry.put_active(xid.clone(), Arc::new(resource))?;
                    info!(rm = %self.config.name, %xid, "reattached in-doubt branch");
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(rm = %self.config.name, %xid, error = %e, "failed to reattach branch");
                }
            }
        }
        Ok(xids)
    }
}

impl<M: ResourceManager + fmt::Debug> fmt::Debug for XaResource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XaResource")
            .field("manager", &self.manager)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
