//! X/Open transaction branch identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Maximum size in bytes of a global transaction id.
pub const MAX_GTRID_SIZE: usize = 64;

/// Maximum size in bytes of a branch qualifier.
pub const MAX_BQUAL_SIZE: usize = 64;

/// Identifies one branch of a global transaction.
///
/// An `Xid` is supplied by the transaction manager and is only ever used as a
/// lookup key on the resource-manager side. Two branches of the same global
/// transaction share a global transaction id and differ in their branch
/// qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Xid {
    format_id: i32,
    gtrid: Vec<u8>,
    bqual: Vec<u8>,
}

impl Xid {
    /// Create a new branch identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the global transaction id is empty
    /// or longer than [`MAX_GTRID_SIZE`], or if the branch qualifier is longer
    /// than [`MAX_BQUAL_SIZE`].
    pub fn new(
        format_id: i32,
        gtrid: impl Into<Vec<u8>>,
        bqual: impl Into<Vec<u8>>,
    ) -> CoreResult<Self> {
        let gtrid = gtrid.into();
        let bqual = bqual.into();

        if gtrid.is_empty() || gtrid.len() > MAX_GTRID_SIZE {
            return Err(CoreError::validation(format!(
                "global transaction id must be 1..={MAX_GTRID_SIZE} bytes, got {}",
                gtrid.len()
            )));
        }
        if bqual.len() > MAX_BQUAL_SIZE {
            return Err(CoreError::validation(format!(
                "branch qualifier must be at most {MAX_BQUAL_SIZE} bytes, got {}",
                bqual.len()
            )));
        }

        Ok(Self { format_id, gtrid, bqual })
    }

    /// Create another branch of the same global transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the qualifier is too long.
    pub fn branch(&self, bqual: impl Into<Vec<u8>>) -> CoreResult<Self> {
        Self::new(self.format_id, self.gtrid.clone(), bqual)
    }

    /// The format identifier chosen by the transaction manager.
    #[must_use]
    pub const fn format_id(&self) -> i32 {
        self.format_id
    }

    /// The global transaction id shared by every branch of the transaction.
    #[must_use]
    pub fn global_transaction_id(&self) -> &[u8] {
        &self.gtrid
    }

    /// The qualifier distinguishing this branch.
    #[must_use]
    pub fn branch_qualifier(&self) -> &[u8] {
        &self.bqual
    }

    /// Returns `true` if `other` belongs to the same global transaction.
    #[must_use]
    pub fn same_global_transaction(&self, other: &Self) -> bool {
        self.format_id == other.format_id && self.gtrid == other.gtrid
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.format_id)?;
        for byte in &self.gtrid {
            write!(f, "{byte:02x}")?;
        }
        f.write_str(":")?;
        for byte in &self.bqual {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_accessors() {
        let xid = Xid::new(7, b"gtx".to_vec(), b"b1".to_vec()).expect("valid xid");
        assert_eq!(xid.format_id(), 7);
        assert_eq!(xid.global_transaction_id(), b"gtx");
        assert_eq!(xid.branch_qualifier(), b"b1");
    }

    #[test]
    fn test_xid_rejects_bad_lengths() {
        assert!(Xid::new(1, Vec::new(), b"b".to_vec()).is_err());
        assert!(Xid::new(1, vec![0u8; MAX_GTRID_SIZE + 1], Vec::new()).is_err());
        assert!(Xid::new(1, b"g".to_vec(), vec![0u8; MAX_BQUAL_SIZE + 1]).is_err());

        // Boundaries are inclusive
        assert!(Xid::new(1, vec![1u8; MAX_GTRID_SIZE], vec![2u8; MAX_BQUAL_SIZE]).is_ok());
        assert!(Xid::new(1, b"g".to_vec(), Vec::new()).is_ok());
    }

    #[test]
    fn test_xid_display() {
        let xid = Xid::new(-1, vec![0xab, 0x01], vec![0xff]).expect("valid xid");
        assert_eq!(xid.to_string(), "-1:ab01:ff");
    }

    #[test]
    fn test_branches_share_global_transaction() {
        let a = Xid::new(3, b"global".to_vec(), b"a".to_vec()).expect("valid xid");
        let b = a.branch(b"b".to_vec()).expect("valid branch");

        assert_ne!(a, b);
        assert!(a.same_global_transaction(&b));

        let other = Xid::new(3, b"other".to_vec(), b"a".to_vec()).expect("valid xid");
        assert!(!a.same_global_transaction(&other));
    }
}
