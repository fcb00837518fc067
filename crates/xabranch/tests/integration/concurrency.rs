//! Concurrency integration tests.
//!
//! Many threads, each with its own session, drive branches through the same
//! `XaResource` at once.

use std::sync::{Arc, Barrier};
use std::thread;

use xabranch::{EndFlags, PrepareOutcome, StartFlags, XaResource, Xid};
use xabranch_resource::backends::{LedgerEngine, LedgerResourceManager};

fn create_xa() -> (Arc<LedgerEngine>, Arc<XaResource<LedgerResourceManager>>) {
    let engine = Arc::new(LedgerEngine::in_memory().expect("failed to create ledger"));
    let xa = Arc::new(XaResource::new(LedgerResourceManager::new(Arc::clone(&engine))));
    (engine, xa)
}

fn xid(worker: usize, round: usize) -> Xid {
    Xid::new(1, format!("w{worker}-r{round}").into_bytes(), b"c".to_vec()).expect("valid xid")
}

/// Sessions on different threads never see each other's binding.
#[test]
fn test_sessions_are_isolated_across_threads() {
    let (_, xa) = create_xa();
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|worker| {
            let xa = Arc::clone(&xa);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let session = xa.open_session();
                let x = xid(worker, 0);

                barrier.wait();
                xa.start(session, &x, StartFlags::NoFlags).expect("start failed");

                // Everyone is bound at this point
                barrier.wait();
                assert_eq!(xa.current(session).expect("current"), Some(x.clone()));

                xa.end(session, &x, EndFlags::Success).expect("end failed");
                xa.rollback(session, &x).expect("rollback failed");
                assert!(xa.current(session).expect("current").is_none());
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    assert!(xa.registry().is_empty().expect("is_empty"));
    assert_eq!(xa.registry().bound_sessions().expect("bound"), 0);
}

/// Full two-phase commits from many threads all land in the ledger.
#[test]
fn test_concurrent_two_phase_commits() {
    let (engine, xa) = create_xa();
    let num_threads = 6;
    let rounds = 20;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|worker| {
            let xa = Arc::clone(&xa);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let session = xa.session();
                barrier.wait();

                for round in 0..rounds {
                    let x = xid(worker, round);
                    session.start(&x, StartFlags::NoFlags).expect("start failed");
                    let branch = session.resource().expect("resource").expect("bound");
                    branch
                        .put(format!("key:{worker}:{round}"), round.to_string())
                        .expect("put failed");
                    session.end(&x, EndFlags::Success).expect("end failed");

                    assert_eq!(session.prepare(&x).expect("prepare failed"), PrepareOutcome::Ok);
                    session.commit(&x, false).expect("commit failed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    for worker in 0..num_threads {
        for round in 0..rounds {
            let key = format!("key:{worker}:{round}");
            let value = engine.get(key.as_bytes()).expect("get failed");
            assert_eq!(value, Some(round.to_string().into_bytes()));
        }
    }
    assert!(xa.registry().is_empty().expect("is_empty"));
    assert!(engine.prepared_xids().expect("scan failed").is_empty());
}

/// One thread suspends branches while another resumes and finishes them.
#[test]
fn test_suspend_on_one_thread_resume_on_another() {
    let (engine, xa) = create_xa();
    let count = 10;

    let producer = {
        let xa = Arc::clone(&xa);
        thread::spawn(move || {
            let session = xa.session();
            for i in 0..count {
                let x = xid(0, i);
                session.start(&x, StartFlags::NoFlags).expect("start failed");
                let branch = session.resource().expect("resource").expect("bound");
                branch.put(format!("item:{i}"), b"produced".to_vec()).expect("put failed");
                session.end(&x, EndFlags::Suspend).expect("end failed");
            }
        })
    };
    producer.join().expect("producer panicked");

    let consumer = {
        let xa = Arc::clone(&xa);
        thread::spawn(move || {
            let session = xa.session();
            for i in 0..count {
                let x = xid(0, i);
                session.start(&x, StartFlags::Resume).expect("resume failed");
                session.end(&x, EndFlags::Success).expect("end failed");
                session.commit(&x, true).expect("commit failed");
            }
        })
    };
    consumer.join().expect("consumer panicked");

    for i in 0..count {
        let value = engine.get(format!("item:{i}").as_bytes()).expect("get failed");
        assert_eq!(value, Some(b"produced".to_vec()));
    }
}
