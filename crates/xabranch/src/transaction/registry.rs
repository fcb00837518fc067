//! Transaction branch registry.
//!
//! The registry tracks every live branch together with the resource
//! coordinating it, and which branch each caller session is currently bound to.
//!
//! Branches live in a single map tagged with their [`Partition`], so an
//! identifier can never be active and suspended at the same time. Session
//! bindings live in a second map; a session has at most one binding.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use xabranch_core::Xid;

use crate::error::{XaError, XaResult};

use super::session::SessionId;

/// The partition a tracked branch sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// The branch is associated with work, or waiting for completion.
    Active,
    /// The branch was suspended by `end` and waits to be resumed.
    Suspended,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        })
    }
}

struct BranchEntry<R> {
    resource: Arc<R>,
    partition: Partition,
}

/// A session's current branch.
pub struct Binding<R> {
    xid: Xid,
    resource: Arc<R>,
}

impl<R> Binding<R> {
    /// Bind to `xid`, coordinated by `resource`.
    #[must_use]
    pub const fn new(xid: Xid, resource: Arc<R>) -> Self {
        Self { xid, resource }
    }

    /// The bound branch.
    #[must_use]
    pub const fn xid(&self) -> &Xid {
        &self.xid
    }

    /// The bound branch's resource.
    #[must_use]
    pub const fn resource(&self) -> &Arc<R> {
        &self.resource
    }
}

impl<R> Clone for Binding<R> {
    fn clone(&self) -> Self {
        Self { xid: self.xid.clone(), resource: Arc::clone(&self.resource) }
    }
}

impl<R> fmt::Debug for Binding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("xid", &self.xid).finish_non_exhaustive()
    }
}

/// Concurrency-safe store of tracked branches and session bindings.
///
/// Every operation is a constant-time map access under a short-lived lock;
/// no lock is held while a resource is being called.
pub struct BranchRegistry<R> {
    branches: RwLock<HashMap<Xid, BranchEntry<R>>>,
    bindings: Mutex<HashMap<SessionId, Binding<R>>>,
}

impl<R> Default for BranchRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> BranchRegistry<R> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { branches: RwLock::new(HashMap::new()), bindings: Mutex::new(HashMap::new()) }
    }

    // ========================================================================
    // Branches
    // ========================================================================

    /// Track `xid` as active. Replaces any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn put_active(&self, xid: Xid, resource: Arc<R>) -> XaResult<()> {
        self.put(xid, resource, Partition::Active)
    }

    /// Track `xid` as suspended. Replaces any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn put_suspended(&self, xid: Xid, resource: Arc<R>) -> XaResult<()> {
        self.put(xid, resource, Partition::Suspended)
    }

    fn put(&self, xid: Xid, resource: Arc<R>, partition: Partition) -> XaResult<()> {
        self.write_branches()?.insert(xid, BranchEntry { resource, partition });
        Ok(())
    }

    /// Stop tracking `xid` if it is active.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn remove_active(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        self.remove_in(xid, Partition::Active)
    }

    /// Stop tracking `xid` if it is suspended.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn remove_suspended(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        self.remove_in(xid, Partition::Suspended)
    }

    fn remove_in(&self, xid: &Xid, partition: Partition) -> XaResult<Option<Arc<R>>> {
        let mut branches = self.write_branches()?;
        if !branches.get(xid).is_some_and(|entry| entry.partition == partition) {
            return Ok(None);
        }
        Ok(branches.remove(xid).map(|entry| entry.resource))
    }

    /// Stop tracking `xid`, whichever partition it is in.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn remove(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        Ok(self.write_branches()?.remove(xid).map(|entry| entry.resource))
    }

    /// Move `xid` from partition `from` to partition `to` in one step.
    ///
    /// Returns the branch's resource, or `None` (and changes nothing) if
    /// `xid` is not tracked in `from`.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn transition(&self, xid: &Xid, from: Partition, to: Partition) -> XaResult<Option<Arc<R>>> {
        let mut branches = self.write_branches()?;
        match branches.get_mut(xid) {
            Some(entry) if entry.partition == from => {
                entry.partition = to;
                Ok(Some(Arc::clone(&entry.resource)))
            }
            _ => Ok(None),
        }
    }

    /// Find `xid` in either partition.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn lookup(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        Ok(self.read_branches()?.get(xid).map(|entry| Arc::clone(&entry.resource)))
    }

    /// Find `xid` among the active branches.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn lookup_active(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        self.lookup_in(xid, Partition::Active)
    }

    /// Find `xid` among the suspended branches.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn lookup_suspended(&self, xid: &Xid) -> XaResult<Option<Arc<R>>> {
        self.lookup_in(xid, Partition::Suspended)
    }

    fn lookup_in(&self, xid: &Xid, partition: Partition) -> XaResult<Option<Arc<R>>> {
        Ok(self
            .read_branches()?
            .get(xid)
            .filter(|entry| entry.partition == partition)
            .map(|entry| Arc::clone(&entry.resource)))
    }

    /// The partition `xid` sits in, if tracked.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn partition_of(&self, xid: &Xid) -> XaResult<Option<Partition>> {
        Ok(self.read_branches()?.get(xid).map(|entry| entry.partition))
    }

    /// Number of tracked branches.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn len(&self) -> XaResult<usize> {
        Ok(self.read_branches()?.len())
    }

    /// Returns `true` if no branch is tracked.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn is_empty(&self) -> XaResult<bool> {
        Ok(self.read_branches()?.is_empty())
    }

    /// Snapshot of the tracked identifiers, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the branch lock is poisoned.
    pub fn xids(&self) -> XaResult<Vec<Xid>> {
        Ok(self.read_branches()?.keys().cloned().collect())
    }

    // ========================================================================
    // Session bindings
    // ========================================================================

    /// The branch `session` is bound to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the binding lock is poisoned.
    pub fn current(&self, session: SessionId) -> XaResult<Option<Binding<R>>> {
        Ok(self.lock_bindings()?.get(&session).cloned())
    }

    /// Bind `session` to `binding`, or clear its slot with `None`.
    ///
    /// Returns the previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the binding lock is poisoned.
    pub fn set_current(
        &self,
        session: SessionId,
        binding: Option<Binding<R>>,
    ) -> XaResult<Option<Binding<R>>> {
        let mut bindings = self.lock_bindings()?;
        Ok(match binding {
            Some(binding) => bindings.insert(session, binding),
            None => bindings.remove(&session),
        })
    }

    /// Clear every session slot bound to `xid`.
    ///
    /// Returns the number of slots cleared.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the binding lock is poisoned.
    pub fn release(&self, xid: &Xid) -> XaResult<usize> {
        let mut bindings = self.lock_bindings()?;
        let before = bindings.len();
        bindings.retain(|_, binding| binding.xid != *xid);
        Ok(before - bindings.len())
    }

    /// Number of sessions currently bound to a branch.
    ///
    /// # Errors
    ///
    /// Returns [`XaError::LockPoisoned`] if the binding lock is poisoned.
    pub fn bound_sessions(&self) -> XaResult<usize> {
        Ok(self.lock_bindings()?.len())
    }

    // ========================================================================
    // Locking
    // ========================================================================

    fn read_branches(&self) -> XaResult<RwLockReadGuard<'_, HashMap<Xid, BranchEntry<R>>>> {
        self.branches
            .read()
            .map_err(|e| XaError::lock_poisoned(format!("failed to acquire branch lock: {e}")))
    }

    fn write_branches(&self) -> XaResult<RwLockWriteGuard<'_, HashMap<Xid, BranchEntry<R>>>> {
        self.branches
            .write()
            .map_err(|e| XaError::lock_poisoned(format!("failed to acquire branch lock: {e}")))
    }

    fn lock_bindings(&self) -> XaResult<MutexGuard<'_, HashMap<SessionId, Binding<R>>>> {
        self.bindings
            .lock()
            .map_err(|e| XaError::lock_poisoned(format!("failed to acquire binding lock: {e}")))
    }
}

impl<R> fmt::Debug for BranchRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let branches = self.branches.read().map(|b| b.len()).unwrap_or(0);
        let bindings = self.bindings.lock().map(|b| b.len()).unwrap_or(0);
        f.debug_struct("BranchRegistry")
            .field("branches", &branches)
            .field("bindings", &bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xid(n: u8) -> Xid {
        Xid::new(1, vec![b'g', n], vec![n]).expect("valid xid")
    }

    #[test]
    fn test_put_and_lookup() {
        let registry = BranchRegistry::new();
        registry.put_active(xid(1), Arc::new("r1")).expect("put failed");
        registry.put_suspended(xid(2), Arc::new("r2")).expect("put failed");

        assert_eq!(registry.lookup(&xid(1)).expect("lookup").as_deref(), Some(&"r1"));
        assert_eq!(registry.lookup(&xid(2)).expect("lookup").as_deref(), Some(&"r2"));
        assert!(registry.lookup_active(&xid(2)).expect("lookup").is_none());
        assert!(registry.lookup_suspended(&xid(1)).expect("lookup").is_none());
        assert!(registry.lookup(&xid(3)).expect("lookup").is_none());
        assert_eq!(registry.len().expect("len"), 2);
    }

    #[test]
    fn test_put_moves_between_partitions() {
        let registry = BranchRegistry::new();
        registry.put_active(xid(1), Arc::new("first")).expect("put failed");
        registry.put_suspended(xid(1), Arc::new("second")).expect("put failed");

        assert_eq!(registry.partition_of(&xid(1)).expect("partition"), Some(Partition::Suspended));
        assert!(registry.lookup_active(&xid(1)).expect("lookup").is_none());
        assert_eq!(registry.lookup(&xid(1)).expect("lookup").as_deref(), Some(&"second"));
        assert_eq!(registry.len().expect("len"), 1);
    }

    #[test]
    fn test_remove_is_partition_specific() {
        let registry = BranchRegistry::new();
        registry.put_suspended(xid(1), Arc::new("r")).expect("put failed");

        assert!(registry.remove_active(&xid(1)).expect("remove").is_none());
        assert!(registry.lookup(&xid(1)).expect("lookup").is_some());

        assert!(registry.remove_suspended(&xid(1)).expect("remove").is_some());
        assert!(registry.is_empty().expect("is_empty"));

        // Removing something absent is a no-op
        assert!(registry.remove(&xid(1)).expect("remove").is_none());
    }

    #[test]
    fn test_transition() {
        let registry = BranchRegistry::new();
        registry.put_active(xid(1), Arc::new("r")).expect("put failed");

        assert!(registry
            .transition(&xid(1), Partition::Suspended, Partition::Active)
            .expect("transition")
            .is_none());
        assert!(registry
            .transition(&xid(1), Partition::Active, Partition::Suspended)
            .expect("transition")
            .is_some());
        assert_eq!(registry.partition_of(&xid(1)).expect("partition"), Some(Partition::Suspended));
    }

    #[test]
    fn test_session_slots() {
        let registry = BranchRegistry::new();
        let (s1, s2) = (SessionId::new(1), SessionId::new(2));
        let resource = Arc::new("r");

        assert!(registry.current(s1).expect("current").is_none());
        registry.set_current(s1, Some(Binding::new(xid(1), Arc::clone(&resource)))).expect("set");
        registry.set_current(s2, Some(Binding::new(xid(1), resource))).expect("set");

        assert_eq!(registry.current(s1).expect("current").map(|b| b.xid().clone()), Some(xid(1)));
        assert_eq!(registry.bound_sessions().expect("bound"), 2);

        let previous = registry.set_current(s1, None).expect("clear");
        assert_eq!(previous.map(|b| b.xid().clone()), Some(xid(1)));
        assert!(registry.current(s1).expect("current").is_none());
        assert!(registry.current(s2).expect("current").is_some());
    }

    #[test]
    fn test_release_clears_all_bindings_for_xid() {
        let registry = BranchRegistry::new();
        let resource = Arc::new("r");
        for n in 1..=3 {
            let x = if n == 3 { xid(9) } else { xid(1) };
            registry
                .set_current(SessionId::new(n), Some(Binding::new(x, Arc::clone(&resource))))
                .expect("set");
        }

        assert_eq!(registry.release(&xid(1)).expect("release"), 2);
        assert_eq!(registry.bound_sessions().expect("bound"), 1);
        assert!(registry.current(SessionId::new(3)).expect("current").is_some());
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let registry = Arc::new(BranchRegistry::<&str>::new());

        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.branches.write().expect("lock");
            panic!("poison the branch lock");
        })
        .join();

        let err = registry.lookup(&xid(1)).expect_err("lock should be poisoned");
        assert!(matches!(err, XaError::LockPoisoned(_)));
    }
}
