//! Core data types for `xabranch`.
//!
//! This module defines the branch identifier and the flag and result types
//! exchanged between a transaction manager and a resource manager.

mod flags;
mod xid;

pub use flags::{EndFlags, PrepareOutcome, RecoverFlags, StartFlags, XaCode};
pub use xid::{Xid, MAX_BQUAL_SIZE, MAX_GTRID_SIZE};
