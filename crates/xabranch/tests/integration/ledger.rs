//! Branch lifecycles over the ledger backend.

use std::sync::Arc;

use xabranch::{EndFlags, PrepareOutcome, StartFlags, XaErrorKind, XaResource, Xid};
use xabranch_resource::backends::{LedgerEngine, LedgerResourceManager};

fn create_xa() -> (Arc<LedgerEngine>, XaResource<LedgerResourceManager>) {
    let engine = Arc::new(LedgerEngine::in_memory().expect("failed to create ledger"));
    let xa = XaResource::new(LedgerResourceManager::new(Arc::clone(&engine)));
    (engine, xa)
}

fn xid(gtrid: &str) -> Xid {
    Xid::new(0x4c, gtrid.as_bytes().to_vec(), b"ledger".to_vec()).expect("valid xid")
}

#[test]
fn test_two_phase_commit_applies_writes() {
    let (engine, xa) = create_xa();
    let session = xa.session();
    let x = xid("transfer-1");

    session.start(&x, StartFlags::NoFlags).expect("start failed");
    let branch = session.resource().expect("resource").expect("bound");
    branch.put(b"account:a", b"90").expect("put failed");
    branch.put(b"account:b", b"110").expect("put failed");
    session.end(&x, EndFlags::Success).expect("end failed");

    assert_eq!(session.prepare(&x).expect("prepare failed"), PrepareOutcome::Ok);
    assert_eq!(engine.prepared_xids().expect("scan failed"), vec![x.clone()]);
    assert_eq!(engine.get(b"account:a").expect("get failed"), None);

    session.commit(&x, false).expect("commit failed");

    assert_eq!(engine.get(b"account:a").expect("get failed"), Some(b"90".to_vec()));
    assert_eq!(engine.get(b"account:b").expect("get failed"), Some(b"110".to_vec()));
    assert!(engine.prepared_xids().expect("scan failed").is_empty());
}

#[test]
fn test_one_phase_commit() {
    let (engine, xa) = create_xa();
    let session = xa.session();
    let x = xid("single");

    session.start(&x, StartFlags::NoFlags).expect("start failed");
    session.resource().expect("resource").expect("bound").put(b"k", b"v").expect("put failed");
    session.end(&x, EndFlags::Success).expect("end failed");

    let err = session.commit(&x, false).expect_err("two-phase commit without prepare");
    assert_eq!(err.kind(), XaErrorKind::ProtocolViolation);

    session.commit(&x, true).expect("one-phase commit failed");
    assert_eq!(engine.get(b"k").expect("get failed"), Some(b"v".to_vec()));
}

#[test]
fn test_read_only_branch_completes_at_prepare() {
    let (engine, xa) = create_xa();
    let session = xa.session();
    let x = xid("reader");

    session.start(&x, StartFlags::NoFlags).expect("start failed");
    let branch = session.resource().expect("resource").expect("bound");
    assert_eq!(branch.get(b"anything").expect("get failed"), None);
    session.end(&x, EndFlags::Success).expect("end failed");

    assert_eq!(session.prepare(&x).expect("prepare failed"), PrepareOutcome::ReadOnly);
    assert!(xa.branch(&x).expect("lookup").is_none());
    assert!(engine.prepared_xids().expect("scan failed").is_empty());
}

#[test]
fn test_failed_branch_rolls_back_cleanly() {
    let (engine, xa) = create_xa();
    let session = xa.session();
    let x = xid("failing");

    session.start(&x, StartFlags::NoFlags).expect("start failed");
    session.resource().expect("resource").expect("bound").put(b"k", b"v").expect("put failed");
    session.end(&x, EndFlags::Fail).expect("end failed");

    assert_eq!(session.prepare(&x).expect_err("prepare").kind(), XaErrorKind::RollbackOnly);
    session.rollback(&x).expect("rollback failed");

    assert_eq!(engine.get(b"k").expect("get failed"), None);
    assert!(xa.registry().is_empty().expect("is_empty"));
}

#[test]
fn test_suspended_branch_keeps_its_writes() {
    let (engine, xa) = create_xa();
    let session = xa.session();
    let x = xid("suspended");

    session.start(&x, StartFlags::NoFlags).expect("start failed");
    session.resource().expect("resource").expect("bound").put(b"first", b"1").expect("put failed");
    session.end(&x, EndFlags::Suspend).expect("end failed");
    assert!(session.resource().expect("resource").is_none());

    session.start(&x, StartFlags::Resume).expect("resume failed");
    let branch = session.resource().expect("resource").expect("bound");
    assert_eq!(branch.get(b"first").expect("get failed"), Some(b"1".to_vec()));
    branch.put(b"second", b"2").expect("put failed");
    session.end(&x, EndFlags::Success).expect("end failed");

    session.commit(&x, true).expect("commit failed");
    assert_eq!(engine.get(b"first").expect("get failed"), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"second").expect("get failed"), Some(b"2".to_vec()));
}

#[test]
fn test_managers_sharing_an_engine_are_the_same_rm() {
    let (engine, xa) = create_xa();
    let same = XaResource::new(LedgerResourceManager::new(Arc::clone(&engine)));
    let (_, other) = create_xa();

    assert!(xa.is_same_rm(&same));
    assert!(!xa.is_same_rm(&other));
}
