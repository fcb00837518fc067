//! Per-branch write buffering.
//!
//! A ledger branch never writes to the data table before commit. Its puts and
//! deletes accumulate in a [`WriteBuffer`], which provides read-your-own-writes
//! while the branch is active and is flattened into [`WriteOp`]s when the
//! branch prepares.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single write operation in a branch's write set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Put a key-value pair.
    Put {
        /// The key.
        key: Vec<u8>,
        /// The value.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// The key.
        key: Vec<u8>,
    },
}

impl WriteOp {
    /// The key this operation touches.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// The pending writes of one branch.
///
/// Only the last operation per key is kept; `None` marks a delete.
#[derive(Debug, Default, Clone)]
pub struct WriteBuffer {
    entries: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteBuffer {
    /// Create a new empty write buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a buffer from a durable write set.
    #[must_use]
    pub fn from_ops(ops: Vec<WriteOp>) -> Self {
        let mut buffer = Self::new();
        for op in ops {
            match op {
                WriteOp::Put { key, value } => buffer.put(key, value),
                WriteOp::Delete { key } => buffer.delete(key),
            }
        }
        buffer
    }

    /// Record a put operation.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, Some(value));
    }

    /// Record a delete operation.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.entries.insert(key, None);
    }

    /// Get a value from the buffer, if written.
    ///
    /// Returns:
    /// - `Some(Some(value))` if the key was written
    /// - `Some(None)` if the key was deleted
    /// - `None` if the key was not modified in this buffer
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.entries.get(key).map(Option::as_deref)
    }

    /// Get the number of keys touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard all pending writes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Flatten the buffer into operations in key order.
    #[must_use]
    pub fn to_ops(&self) -> Vec<WriteOp> {
        self.entries
            .iter()
            .map(|(key, value)| match value {
                Some(value) => WriteOp::Put { key: key.clone(), value: value.clone() },
                None => WriteOp::Delete { key: key.clone() },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_buffer_basic() {
        let mut buffer = WriteBuffer::new();

        buffer.put(b"key1".to_vec(), b"value1".to_vec());
        buffer.put(b"key2".to_vec(), b"value2".to_vec());

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(b"key1"), Some(Some(b"value1".as_slice())));
        assert_eq!(buffer.get(b"key2"), Some(Some(b"value2".as_slice())));
        assert_eq!(buffer.get(b"key3"), None);
    }

    #[test]
    fn test_write_buffer_last_write_wins() {
        let mut buffer = WriteBuffer::new();

        buffer.put(b"key".to_vec(), b"value1".to_vec());
        buffer.put(b"key".to_vec(), b"value2".to_vec());
        assert_eq!(buffer.get(b"key"), Some(Some(b"value2".as_slice())));

        buffer.delete(b"key".to_vec());
        assert_eq!(buffer.get(b"key"), Some(None));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_ops_are_key_ordered_and_rebuildable() {
        let mut buffer = WriteBuffer::new();
        buffer.put(b"b".to_vec(), b"2".to_vec());
        buffer.delete(b"c".to_vec());
        buffer.put(b"a".to_vec(), b"1".to_vec());

        let ops = buffer.to_ops();
        let keys: Vec<&[u8]> = ops.iter().map(WriteOp::key).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);

        let rebuilt = WriteBuffer::from_ops(ops);
        assert_eq!(rebuilt.get(b"c"), Some(None));
        assert_eq!(rebuilt.get(b"a"), Some(Some(b"1".as_slice())));
    }
}
