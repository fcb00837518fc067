//! Binary key encoding for branch identifiers.
//!
//! The key format is:
//!
//! ```text
//! [format_id: i32 big-endian][gtrid_len: u8][gtrid][bqual_len: u8][bqual]
//! ```
//!
//! Both length prefixes fit in a byte because an [`Xid`] never carries more
//! than 64 bytes in either part.

use crate::error::{CoreError, CoreResult};
use crate::types::Xid;

/// Encode a branch identifier as a storage key.
#[must_use]
pub fn encode_xid(xid: &Xid) -> Vec<u8> {
    let gtrid = xid.global_transaction_id();
    let bqual = xid.branch_qualifier();

    let mut key = Vec::with_capacity(6 + gtrid.len() + bqual.len());
    key.extend_from_slice(&xid.format_id().to_be_bytes());
    // Xid construction bounds both parts to 64 bytes
    key.push(gtrid.len() as u8);
    key.extend_from_slice(gtrid);
    key.push(bqual.len() as u8);
    key.extend_from_slice(bqual);
    key
}

/// Decode a storage key produced by [`encode_xid`].
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] if the key is truncated or carries trailing
/// bytes, and [`CoreError::Validation`] if the decoded parts do not form a
/// valid [`Xid`].
pub fn decode_xid(bytes: &[u8]) -> CoreResult<Xid> {
    let (format_bytes, rest) = split(bytes, 4, "format id")?;
    let mut format_id = [0u8; 4];
    format_id.copy_from_slice(format_bytes);

    let (gtrid_len, rest) = split(rest, 1, "gtrid length")?;
    let (gtrid, rest) = split(rest, usize::from(gtrid_len[0]), "gtrid")?;
    let (bqual_len, rest) = split(rest, 1, "bqual length")?;
    let (bqual, rest) = split(rest, usize::from(bqual_len[0]), "bqual")?;

    if !rest.is_empty() {
        return Err(CoreError::encoding(format!("{} trailing bytes after xid", rest.len())));
    }

    Xid::new(i32::from_be_bytes(format_id), gtrid.to_vec(), bqual.to_vec())
}

fn split<'a>(bytes: &'a [u8], len: usize, what: &str) -> CoreResult<(&'a [u8], &'a [u8])> {
    if bytes.len() < len {
        return Err(CoreError::encoding(format!(
            "truncated xid key: need {len} bytes for {what}, have {}",
            bytes.len()
        )));
    }
    Ok(bytes.split_at(len))
}
