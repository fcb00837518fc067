//! Recovery integration tests.
//!
//! A branch prepared before a restart must be listed by `recover` and be
//! completable from a fresh `XaResource` over the reopened ledger.

use std::path::Path;
use std::sync::Arc;

use xabranch::{EndFlags, PrepareOutcome, RecoverFlags, StartFlags, XaResource, Xid};
use xabranch_resource::backends::{LedgerEngine, LedgerResourceManager};

fn open(path: &Path) -> (Arc<LedgerEngine>, XaResource<LedgerResourceManager>) {
    let engine = Arc::new(LedgerEngine::open(path).expect("failed to open ledger"));
    let xa = XaResource::new(LedgerResourceManager::new(Arc::clone(&engine)));
    (engine, xa)
}

fn xid(gtrid: &str) -> Xid {
    Xid::new(0x52, gtrid.as_bytes().to_vec(), b"r".to_vec()).expect("valid xid")
}

/// Prepare `x` writing `key = value`, then drop everything without a decision.
fn prepare_and_crash(path: &Path, x: &Xid, key: &[u8], value: &[u8]) {
    let (_, xa) = open(path);
    let session = xa.session();

    session.start(x, StartFlags::NoFlags).expect("start failed");
    session.resource().expect("resource").expect("bound").put(key, value).expect("put failed");
    session.end(x, EndFlags::Success).expect("end failed");
    assert_eq!(session.prepare(x).expect("prepare failed"), PrepareOutcome::Ok);
}

#[test]
fn test_recover_and_commit_after_restart() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("recovery.redb");
    let x = xid("in-doubt");

    prepare_and_crash(&path, &x, b"order:7", b"shipped");

    let (engine, xa) = open(&path);
    assert_eq!(engine.get(b"order:7").expect("get failed"), None);

    let in_doubt = xa.recover(RecoverFlags::FULL_SCAN).expect("recover failed");
    assert_eq!(in_doubt, vec![x.clone()]);
    assert!(xa.branch(&x).expect("lookup").is_some());

    let session = xa.session();
    session.commit(&x, false).expect("commit failed");

    assert_eq!(engine.get(b"order:7").expect("get failed"), Some(b"shipped".to_vec()));
    assert!(xa.recover(RecoverFlags::FULL_SCAN).expect("recover failed").is_empty());
}

#[test]
fn test_recover_and_rollback_after_restart() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("recovery.redb");
    let (commit_me, abort_me) = (xid("commit-me"), xid("abort-me"));

    prepare_and_crash(&path, &commit_me, b"a", b"1");
    prepare_and_crash(&path, &abort_me, b"b", b"2");

    let (engine, xa) = open(&path);
    let mut in_doubt = xa.recover(RecoverFlags::START_SCAN).expect("recover failed");
    in_doubt.sort();
    let mut expected = vec![commit_me.clone(), abort_me.clone()];
    expected.sort();
    assert_eq!(in_doubt, expected);

    // Continuation calls have nothing further to report
    assert!(xa.recover(RecoverFlags::END_SCAN).expect("recover failed").is_empty());

    let session = xa.session();
    session.commit(&commit_me, false).expect("commit failed");
    session.rollback(&abort_me).expect("rollback failed");

    assert_eq!(engine.get(b"a").expect("get failed"), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"b").expect("get failed"), None);
    assert!(engine.prepared_xids().expect("scan failed").is_empty());
}

#[test]
fn test_recover_without_in_doubt_branches() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let (_, xa) = open(&dir.path().join("empty.redb"));

    assert!(xa.recover(RecoverFlags::FULL_SCAN).expect("recover failed").is_empty());
    assert!(xa.registry().is_empty().expect("is_empty"));
}
