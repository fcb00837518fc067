//! `xabranch` Core
//!
//! This crate provides the fundamental types shared by every `xabranch` crate:
//! the X/Open branch identifier, the protocol flag sets exchanged with a
//! transaction manager, and the encodings storage backends need to persist them.
//!
//! # Overview
//!
//! - **Identifiers**: [`Xid`] names one branch of a global transaction
//! - **Flags**: [`StartFlags`], [`EndFlags`], [`RecoverFlags`] and the
//!   [`PrepareOutcome`] vote, each mappable to raw XA integers
//! - **Return codes**: [`XaCode`] mirrors the X/Open `XA_*` / `XAER_*` values
//!
//! # Example
//!
//! ```
//! use xabranch_core::{StartFlags, Xid};
//!
//! let xid = Xid::new(0x1234, b"order-42".to_vec(), b"inventory".to_vec()).unwrap();
//! assert_eq!(xid.global_transaction_id(), b"order-42");
//!
//! // Raw flags from a transaction manager are validated on the way in
//! assert_eq!(StartFlags::try_from(0x0020_0000).unwrap(), StartFlags::Join);
//! assert!(StartFlags::try_from(0x7).is_err());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Branch identifiers and protocol flags
//! - [`encoding`] - Binary key encoding and identifier-to-path mapping
//! - [`error`] - Error types ([`CoreError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use types::{EndFlags, PrepareOutcome, RecoverFlags, StartFlags, XaCode, Xid};
