//! Integration tests for xabranch.
//!
//! These tests drive the XA state machine over the redb ledger backend, from
//! single branches through concurrent sessions to recovery after a restart.

pub mod concurrency;
pub mod ledger;
pub mod recovery;
