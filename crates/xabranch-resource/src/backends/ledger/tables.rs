//! Redb table definitions and durable record encoding.
//!
//! The ledger uses two physical tables:
//!
//! - [`DATA_TABLE`] holds committed key-value pairs.
//! - [`PREPARED_TABLE`] holds one record per prepared branch, keyed by the
//!   branch's encoded [`Xid`](xabranch_core::Xid). A record exists exactly
//!   while the branch is prepared but not yet committed or rolled back, which
//!   is what recovery reports after a restart.

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::resource::{ResourceError, ResourceResult};

use super::buffer::WriteOp;

/// Committed key-value pairs.
pub const DATA_TABLE: TableDefinition<'static, &[u8], &[u8]> =
    TableDefinition::new("xabranch_data");

/// Prepare records of in-doubt branches.
pub const PREPARED_TABLE: TableDefinition<'static, &[u8], &[u8]> =
    TableDefinition::new("xabranch_prepared");

/// Format version for serialized prepare records.
pub const RECORD_VERSION: u8 = 1;

/// The durable image of a prepared branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedRecord {
    /// Record format version.
    pub version: u8,
    /// The branch's write set, in key order.
    pub writes: Vec<WriteOp>,
}

impl PreparedRecord {
    /// Create a record for the given write set.
    #[must_use]
    pub const fn new(writes: Vec<WriteOp>) -> Self {
        Self { version: RECORD_VERSION, writes }
    }

    /// Serialize the record for storage.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> ResourceResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ResourceError::Serialization(e.to_string()))
    }

    /// Deserialize a record read from storage.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Serialization`] if the bytes are malformed or
    /// carry an unknown format version.
    pub fn from_bytes(bytes: &[u8]) -> ResourceResult<Self> {
        let (record, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| ResourceError::Serialization(e.to_string()))?;

        if record.version != RECORD_VERSION {
            return Err(ResourceError::Serialization(format!(
                "unsupported prepare record version {}",
                record.version
            )));
        }
        Ok(record)
    }
}
