//! Resource manager over a shared ledger.

use std::sync::Arc;

use tracing::debug;
use xabranch_core::{RecoverFlags, Xid};

use crate::resource::{ResourceManager, ResourceResult};

use super::branch::LedgerBranch;
use super::buffer::WriteBuffer;
use super::engine::LedgerEngine;

/// Hands out [`LedgerBranch`]es over one [`LedgerEngine`].
///
/// Cloning is cheap; clones share the engine and compare as the same
/// resource manager.
#[derive(Debug, Clone)]
pub struct LedgerResourceManager {
    engine: Arc<LedgerEngine>,
}

impl LedgerResourceManager {
    /// Create a manager over `engine`.
    #[must_use]
    pub const fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    /// The engine backing this manager.
    #[must_use]
    pub const fn engine(&self) -> &Arc<LedgerEngine> {
        &self.engine
    }
}

impl ResourceManager for LedgerResourceManager {
    type Resource = LedgerBranch;

    fn create_resource(&self, xid: &Xid) -> ResourceResult<LedgerBranch> {
        Ok(LedgerBranch::new(xid.clone(), Arc::clone(&self.engine)))
    }

    fn is_same_rm(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }

    fn recover(&self, flags: RecoverFlags) -> ResourceResult<Vec<Xid>> {
        // The whole list is returned when a scan opens; continuation calls
        // have nothing left to report.
        if !flags.start_scan {
            return Ok(Vec::new());
        }
        let xids = self.engine.prepared_xids()?;
        debug!(count = xids.len(), "ledger recovery scan");
        Ok(xids)
    }

    fn reattach(&self, xid: &Xid) -> ResourceResult<Option<LedgerBranch>> {
        let Some(record) = self.engine.load_prepared(xid)? else {
            return Ok(None);
        };
        let writes = WriteBuffer::from_ops(record.writes);
        Ok(Some(LedgerBranch::reattached(xid.clone(), Arc::clone(&self.engine), writes)))
    }
}
