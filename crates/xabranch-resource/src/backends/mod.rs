//! Resource backend implementations.
//!
//! - [`ledger`] - Durable key-value ledger on redb

pub mod ledger;

pub use ledger::{LedgerBranch, LedgerConfig, LedgerEngine, LedgerResourceManager};
