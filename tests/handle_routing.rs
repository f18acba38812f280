//! Integration tests for handle traffic routed through the live singleton.
//!
//! NOTE: All tests use #[serial] because they share the one process-global
//! singleton slot.

use std::sync::{Arc, Barrier};
use std::thread;

use serial_test::serial;

use httpc_core::{handles, HandleId, PlatformContext};

#[derive(Debug)]
struct StubContext;
impl PlatformContext for StubContext {}

fn fresh_singleton() {
    httpc_core::cleanup();
    httpc_core::init(|| Ok(Box::new(StubContext))).unwrap();
}

#[test]
#[serial]
fn test_store_without_singleton_degrades_to_null() {
    httpc_core::cleanup();

    // Shutdown races hit this path; it must not assert.
    let id = handles::store(Arc::new(1u8));
    assert!(id.is_null());
    assert_eq!(id, HandleId::NULL);
    assert!(handles::fetch::<u8>(id, true, false).is_none());
    handles::remove(id);
}

#[test]
#[serial]
fn test_round_trip_through_singleton() {
    fresh_singleton();

    #[derive(Debug, PartialEq)]
    struct ConnectionState {
        endpoint: String,
    }

    let id = handles::store(Arc::new(ConnectionState {
        endpoint: "wss://example.test/socket".to_string(),
    }));
    assert!(!id.is_null());

    let fetched: Arc<ConnectionState> = handles::fetch(id, true, true).unwrap();
    assert_eq!(fetched.endpoint, "wss://example.test/socket");
    assert!(handles::fetch::<ConnectionState>(id, true, false).is_none());

    httpc_core::cleanup();
}

#[test]
#[serial]
fn test_non_deleting_fetch_then_remove() {
    fresh_singleton();

    let id = handles::store(Arc::new(99i64));
    let first: Arc<i64> = handles::fetch(id, false, true).unwrap();
    let second: Arc<i64> = handles::fetch(id, false, true).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    handles::remove(id);
    assert!(handles::fetch::<i64>(id, false, false).is_none());

    httpc_core::cleanup();
}

#[test]
#[serial]
fn test_concurrent_stores_are_individually_fetchable() {
    fresh_singleton();

    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let barrier = Arc::new(Barrier::new(THREADS));
    let spawned: Vec<_> = (0..THREADS)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|i| {
                        let payload = format!("call-{t}-{i}");
                        (payload.clone(), handles::store(Arc::new(payload)))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut stored: Vec<(String, HandleId)> = spawned
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(stored.len(), THREADS * PER_THREAD);

    let mut ids: Vec<HandleId> = stored.iter().map(|(_, id)| *id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * PER_THREAD, "identities must be unique");

    for (payload, id) in stored.drain(..) {
        let fetched: Arc<String> = handles::fetch(id, true, true).unwrap();
        assert_eq!(*fetched, payload);
    }

    httpc_core::cleanup();
}
