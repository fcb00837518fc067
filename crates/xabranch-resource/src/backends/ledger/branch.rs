//! A single branch's view of the ledger.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use xabranch_core::Xid;

use crate::resource::{ResourceError, ResourceResult, TransactionalResource};

use super::buffer::WriteBuffer;
use super::engine::LedgerEngine;

/// Lifecycle of a ledger branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// Created but not yet started.
    Idle,
    /// Accepting writes.
    Active,
    /// Voted to commit; writes are frozen.
    Prepared,
    /// Writes applied to the ledger.
    Committed,
    /// Writes discarded.
    RolledBack,
}

impl BranchStatus {
    /// Returns `true` once the branch has committed or rolled back.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Prepared => "prepared",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        })
    }
}

#[derive(Debug)]
struct BranchState {
    status: BranchStatus,
    rollback_only: bool,
    writes: WriteBuffer,
    /// Whether a prepare record exists in the ledger.
    durable: bool,
}

/// One transaction branch over a [`LedgerEngine`].
///
/// Writes are buffered in memory until the branch commits. Reads see the
/// branch's own writes first, then committed data.
///
/// ```text
/// Idle ─start─► Active ─prepare─► Prepared ─commit─► Committed
///                  │                  │
///                  └──────rollback────┴────────────► RolledBack
/// ```
pub struct LedgerBranch {
    xid: Xid,
    engine: Arc<LedgerEngine>,
    state: Mutex<BranchState>,
}

impl LedgerBranch {
    pub(crate) fn new(xid: Xid, engine: Arc<LedgerEngine>) -> Self {
        let state = BranchState {
            status: BranchStatus::Idle,
            rollback_only: false,
            writes: WriteBuffer::new(),
            durable: false,
        };
        Self { xid, engine, state: Mutex::new(state) }
    }

    /// Rebuild a prepared branch from its durable write set.
    pub(crate) fn reattached(xid: Xid, engine: Arc<LedgerEngine>, writes: WriteBuffer) -> Self {
        let state =
            BranchState { status: BranchStatus::Prepared, rollback_only: false, writes, durable: true };
        Self { xid, engine, state: Mutex::new(state) }
    }

    /// The branch this resource serves.
    #[must_use]
    pub const fn xid(&self) -> &Xid {
        &self.xid
    }

    /// The current lifecycle status.
    #[must_use]
    pub fn status(&self) -> BranchStatus {
        self.lock().status
    }

    /// Buffer a put.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::State`] unless the branch is active.
    pub fn put(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> ResourceResult<()> {
        let mut state = self.lock();
        Self::require(&state, BranchStatus::Active, "write")?;
        state.writes.put(key.into(), value.into());
        Ok(())
    }

    /// Buffer a delete.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::State`] unless the branch is active.
    pub fn delete(&self, key: impl Into<Vec<u8>>) -> ResourceResult<()> {
        let mut state = self.lock();
        Self::require(&state, BranchStatus::Active, "delete")?;
        state.writes.delete(key.into());
        Ok(())
    }

    /// Read a value, preferring this branch's own pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Storage`] if the committed read fails.
    pub fn get(&self, key: &[u8]) -> ResourceResult<Option<Vec<u8>>> {
        {
            let state = self.lock();
            if let Some(pending) = state.writes.get(key) {
                return Ok(pending.map(<[u8]>::to_vec));
            }
        }
        self.engine.get(key)
    }

    /// Number of keys this branch has written or deleted.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.lock().writes.len()
    }

    // A panic while holding the lock cannot leave the state half-updated:
    // every transition is a single assignment after the fallible work.
    fn lock(&self) -> MutexGuard<'_, BranchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require(state: &BranchState, expected: BranchStatus, op: &str) -> ResourceResult<()> {
        if state.status == expected {
            Ok(())
        } else {
            Err(ResourceError::state(format!("cannot {op}: branch is {}", state.status)))
        }
    }
}

impl TransactionalResource for LedgerBranch {
    fn start_transaction(&self) -> ResourceResult<()> {
        let mut state = self.lock();
        Self::require(&state, BranchStatus::Idle, "start")?;
        state.status = BranchStatus::Active;
        debug!(xid = %self.xid, "ledger branch started");
        Ok(())
    }

    fn prepare_transaction(&self) -> ResourceResult<bool> {
        let mut state = self.lock();
        Self::require(&state, BranchStatus::Active, "prepare")?;

        if state.rollback_only {
            return Ok(false);
        }

        if !state.writes.is_empty() {
            self.engine.write_prepared(&self.xid, state.writes.to_ops())?;
            state.durable = true;
        }
        state.status = BranchStatus::Prepared;
        debug!(xid = %self.xid, writes = state.writes.len(), durable = state.durable, "ledger branch prepared");
        Ok(true)
    }

    fn commit_transaction(&self) -> ResourceResult<()> {
        let mut state = self.lock();
        Self::require(&state, BranchStatus::Prepared, "commit")?;

        if state.durable || !state.writes.is_empty() {
            self.engine.apply_commit(&self.xid, &state.writes.to_ops(), state.durable)?;
        }
        state.writes.clear();
        state.durable = false;
        state.status = BranchStatus::Committed;
        debug!(xid = %self.xid, "ledger branch committed");
        Ok(())
    }

    fn rollback_transaction(&self) -> ResourceResult<()> {
        let mut state = self.lock();
        if state.status.is_terminal() {
            return Err(ResourceError::state(format!("cannot roll back: branch is {}", state.status)));
        }

        if state.durable {
            self.engine.discard_prepared(&self.xid)?;
            state.durable = false;
        }
        state.writes.clear();
        state.status = BranchStatus::RolledBack;
        debug!(xid = %self.xid, "ledger branch rolled back");
        Ok(())
    }

    fn mark_transaction_for_rollback(&self) {
        self.lock().rollback_only = true;
    }

    fn is_transaction_marked_for_rollback(&self) -> bool {
        self.lock().rollback_only
    }

    fn is_transaction_prepared(&self) -> bool {
        self.lock().status == BranchStatus::Prepared
    }

    fn is_read_only_transaction(&self) -> bool {
        self.lock().writes.is_empty()
    }
}

impl fmt::Debug for LedgerBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerBranch").field("xid", &self.xid).field("state", &*self.lock()).finish()
    }
}
