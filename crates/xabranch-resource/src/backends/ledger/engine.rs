//! Ledger engine implementation.
//!
//! This module provides the `LedgerEngine` type which owns the redb database
//! shared by every branch of one resource manager.

use std::fmt;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable};
use xabranch_core::encoding::keys::{decode_xid, encode_xid};
use xabranch_core::encoding::path::{ResourceIdToPathMapper, UrlEncodeIdMapper};
use xabranch_core::Xid;

use crate::resource::{ResourceError, ResourceResult};

use super::buffer::WriteOp;
use super::tables::{PreparedRecord, DATA_TABLE, PREPARED_TABLE};

/// File extension of ledger stores created by [`LedgerEngine::open_in`].
pub const STORE_EXTENSION: &str = "redb";

/// Configuration options for the ledger engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerConfig {
    /// Cache size in bytes.
    /// If not set, uses redb's default.
    pub cache_size: Option<usize>,
}

impl LedgerConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }
}

/// A durable key-value ledger backed by redb.
///
/// The engine holds committed data and the prepare records of in-doubt
/// branches. Branches never write to it directly until they commit; see
/// [`LedgerBranch`](super::LedgerBranch).
///
/// # Example
///
/// ```ignore
/// use xabranch_resource::backends::ledger::LedgerEngine;
///
/// let engine = LedgerEngine::open_in("/var/lib/app", "orders db")?;
/// // Stored as "/var/lib/app/orders+db.redb"
/// assert_eq!(engine.get(b"order:1")?, None);
/// ```
pub struct LedgerEngine {
    db: Database,
    path: Option<PathBuf>,
}

impl LedgerEngine {
    /// Open or create a ledger at the given path with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Open`] if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> ResourceResult<Self> {
        Self::open_with_config(path, LedgerConfig::default())
    }

    /// Open or create a ledger at the given path with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Open`] if the database cannot be opened or created.
    pub fn open_with_config(path: impl AsRef<Path>, config: LedgerConfig) -> ResourceResult<Self> {
        let mut builder = Database::builder();

        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let path = path.as_ref();
        let db = builder.create(path).map_err(|e| ResourceError::Open(e.to_string()))?;

        Ok(Self { db, path: Some(path.to_path_buf()) })
    }

    /// Open or create the named store inside `dir`.
    ///
    /// The store name is mapped to a file name with [`UrlEncodeIdMapper`], so
    /// any name is accepted. The directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] if the directory cannot be created and
    /// [`ResourceError::Open`] if the database cannot be opened.
    pub fn open_in(dir: impl AsRef<Path>, store_name: &str) -> ResourceResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let file_name = format!("{}.{STORE_EXTENSION}", UrlEncodeIdMapper.path_for_id(&store_name));
        Self::open(dir.join(file_name))
    }

    /// Create an in-memory ledger for testing.
    ///
    /// The data is lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Open`] if the database cannot be created.
    pub fn in_memory() -> ResourceResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| ResourceError::Open(e.to_string()))?;

        Ok(Self { db, path: None })
    }

    /// The file backing this ledger, or `None` for an in-memory ledger.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read a committed value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Storage`] if the read fails.
    pub fn get(&self, key: &[u8]) -> ResourceResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(|e| ResourceError::storage(e.to_string()))?;

        match tx.open_table(DATA_TABLE) {
            Ok(t) => match t.get(key) {
                Ok(Some(value)) => Ok(Some(value.value().to_vec())),
                Ok(None) => Ok(None),
                Err(e) => Err(ResourceError::storage(e.to_string())),
            },
            // Nothing committed yet
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(ResourceError::storage(e.to_string())),
        }
    }

    /// List the branches holding a durable prepare record, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Storage`] if the table cannot be read and
    /// [`ResourceError::Core`] if a stored key is not a valid branch id.
    pub fn prepared_xids(&self) -> ResourceResult<Vec<Xid>> {
        let tx = self.db.begin_read().map_err(|e| ResourceError::storage(e.to_string()))?;

        let table = match tx.open_table(PREPARED_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(ResourceError::storage(e.to_string())),
        };

        let mut xids = Vec::new();
        for entry in table.iter().map_err(|e| ResourceError::storage(e.to_string()))? {
            let (key, _) = entry.map_err(|e| ResourceError::storage(e.to_string()))?;
            xids.push(decode_xid(key.value())?);
        }
        Ok(xids)
    }

    /// Load the prepare record of `xid`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Storage`] if the read fails and
    /// [`ResourceError::Serialization`] if the record is malformed.
    pub fn load_prepared(&self, xid: &Xid) -> ResourceResult<Option<PreparedRecord>> {
        let tx = self.db.begin_read().map_err(|e| ResourceError::storage(e.to_string()))?;

        match tx.open_table(PREPARED_TABLE) {
            Ok(t) => match t.get(encode_xid(xid).as_slice()) {
                Ok(Some(bytes)) => PreparedRecord::from_bytes(bytes.value()).map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(ResourceError::storage(e.to_string())),
            },
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(ResourceError::storage(e.to_string())),
        }
    }

    /// Durably store the write set of a prepared branch.
    pub(crate) fn write_prepared(&self, xid: &Xid, ops: Vec<WriteOp>) -> ResourceResult<()> {
        let bytes = PreparedRecord::new(ops).to_bytes()?;

        let tx = self.db.begin_write().map_err(|e| ResourceError::storage(e.to_string()))?;
        {
            let mut t =
                tx.open_table(PREPARED_TABLE).map_err(|e| ResourceError::storage(e.to_string()))?;
            t.insert(encode_xid(xid).as_slice(), bytes.as_slice())
                .map_err(|e| ResourceError::storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| ResourceError::storage(e.to_string()))
    }

    /// Apply a branch's writes to the data table.
    ///
    /// When `durable` is set the branch's prepare record is removed in the
    /// same redb transaction, so a crash leaves either the record or the data.
    pub(crate) fn apply_commit(
        &self,
        xid: &Xid,
        ops: &[WriteOp],
        durable: bool,
    ) -> ResourceResult<()> {
        let tx = self.db.begin_write().map_err(|e| ResourceError::storage(e.to_string()))?;
        {
            let mut data =
                tx.open_table(DATA_TABLE).map_err(|e| ResourceError::storage(e.to_string()))?;
            for op in ops {
                match op {
                    WriteOp::Put { key, value } => {
                        data.insert(key.as_slice(), value.as_slice())
                            .map_err(|e| ResourceError::storage(e.to_string()))?;
                    }
                    WriteOp::Delete { key } => {
                        data.remove(key.as_slice())
                            .map_err(|e| ResourceError::storage(e.to_string()))?;
                    }
                }
            }

            if durable {
                let mut prepared = tx
                    .open_table(PREPARED_TABLE)
                    .map_err(|e| ResourceError::storage(e.to_string()))?;
                prepared
                    .remove(encode_xid(xid).as_slice())
                    .map_err(|e| ResourceError::storage(e.to_string()))?;
            }
        }
        tx.commit().map_err(|e| ResourceError::storage(e.to_string()))
    }

    /// Drop the prepare record of `xid`. Missing records are ignored.
    pub(crate) fn discard_prepared(&self, xid: &Xid) -> ResourceResult<()> {
        let tx = self.db.begin_write().map_err(|e| ResourceError::storage(e.to_string()))?;
        {
            let mut t =
                tx.open_table(PREPARED_TABLE).map_err(|e| ResourceError::storage(e.to_string()))?;
            t.remove(encode_xid(xid).as_slice())
                .map_err(|e| ResourceError::storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| ResourceError::storage(e.to_string()))
    }
}

impl fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerEngine").field("path", &self.path).finish_non_exhaustive()
    }
}
