//! Key encoding and identifier-to-path mapping for storage backends.
//!
//! # Key Encoding
//!
//! The [`keys`] module encodes an [`Xid`](crate::types::Xid) into a compact,
//! self-delimiting byte key. Backends use it to index durable per-branch
//! records, for example the prepare records a resource manager reports during
//! recovery.
//!
//! # Path Mapping
//!
//! The [`path`] module maps arbitrary identifiers to strings that are safe to
//! use as file names, using `application/x-www-form-urlencoded` rules.
//!
//! # Example
//!
//! ```
//! use xabranch_core::encoding::keys::{decode_xid, encode_xid};
//! use xabranch_core::encoding::path::{ResourceIdToPathMapper, UrlEncodeIdMapper};
//! use xabranch_core::Xid;
//!
//! let xid = Xid::new(1, b"gtx".to_vec(), b"b".to_vec()).unwrap();
//! let key = encode_xid(&xid);
//! assert_eq!(decode_xid(&key).unwrap(), xid);
//!
//! assert_eq!(UrlEncodeIdMapper.path_for_id(&"a b/c"), "a+b%2Fc");
//! ```

pub mod keys;
pub mod path;
