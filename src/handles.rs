//! Generic opaque-handle ownership table.
//!
//! Internal objects are handed across the API boundary as plain [`HandleId`]
//! tokens, safe to store in arrays, pass through foreign code, and compare
//! for equality, while the table keeps an extra shared-ownership share so the
//! underlying object stays alive until explicitly released. This decouples
//! external handle lifetime from internal reference-counted lifetime.
//!
//! Identities are issued from an atomic counter rather than derived from the
//! stored value's address: Rust storage may move, so an address is not a
//! stable key.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use httpc_core::HandleTable;
//!
//! let table = HandleTable::new();
//! let id = table.store(Arc::new("connection state".to_string()));
//!
//! // "Take" semantics: fetch with delete_entry removes the table's share.
//! let value: Arc<String> = table.fetch(id, true, true).unwrap();
//! assert_eq!(&*value, "connection state");
//! assert!(table.fetch::<String>(id, true, false).is_none());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::invariant_violation;
use crate::singleton;

/// Opaque handle standing in for a shared-owned object retained in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    /// The null handle, returned by [`store`] when no singleton is live.
    /// Never issued for a real entry.
    pub const NULL: HandleId = HandleId(0);

    /// Whether this is the null handle.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Type-erased shared-ownership store keyed by generated token.
pub struct HandleTable {
    entries: Mutex<HashMap<HandleId, Arc<dyn Any + Send + Sync>>>,
    next_id: AtomicU64,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        HandleTable {
            entries: Mutex::new(HashMap::new()),
            // Ids start at 1; 0 is reserved for HandleId::NULL.
            next_id: AtomicU64::new(1),
        }
    }

    /// Takes a shared-ownership share of `value` and returns its handle.
    ///
    /// The table keeps the value alive even if all other owners release it,
    /// until the entry is removed or fetched with deletion.
    pub fn store<T: Send + Sync + 'static>(&self, value: Arc<T>) -> HandleId {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().insert(id, value);
        tracing::debug!(handle = id.0, "handle stored");
        id
    }

    /// Looks up a handle, downcasting back to the originally stored type.
    ///
    /// With `delete_entry` the table's ownership share is removed as well:
    /// a "take" that transfers the share to the caller. A missing entry (or a
    /// downcast to a type other than the one stored) with `assert_if_missing`
    /// is a fatal precondition violation; without it, `None`.
    pub fn fetch<T: Send + Sync + 'static>(
        &self,
        id: HandleId,
        delete_entry: bool,
        assert_if_missing: bool,
    ) -> Option<Arc<T>> {
        let mut entries = self.entries.lock();
        let Some(value) = entries.get(&id) else {
            drop(entries);
            if assert_if_missing {
                invariant_violation(&format!("handle {} not found", id.0));
            }
            return None;
        };
        let Ok(typed) = Arc::clone(value).downcast::<T>() else {
            // Wrong type requested; leave the entry in place.
            drop(entries);
            if assert_if_missing {
                invariant_violation(&format!(
                    "handle {} does not refer to a {}",
                    id.0,
                    std::any::type_name::<T>()
                ));
            }
            return None;
        };
        if delete_entry {
            entries.remove(&id);
        }
        Some(typed)
    }

    /// Drops the table's ownership share for `id` if present; no-op otherwise.
    pub fn remove(&self, id: HandleId) {
        self.entries.lock().remove(&id);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Teardown-only sweep. The table is expected to be empty here; live
    /// entries mean a caller never released a handle, which is reported as a
    /// fatal invariant violation rather than swallowed.
    pub(crate) fn drain_and_assert_empty(&self) {
        let mut entries = self.entries.lock();
        let leaked = entries.len();
        entries.clear();
        drop(entries);
        if leaked != 0 {
            invariant_violation(&format!("{leaked} handle(s) still live at cleanup"));
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Singleton-routed conveniences
// -------------------------------------------------------------------------------------------------

/// Stores `value` in the live singleton's handle table.
///
/// Returns [`HandleId::NULL`] when no singleton is live; this entry point may
/// be hit during shutdown races and must degrade gracefully.
pub fn store<T: Send + Sync + 'static>(value: Arc<T>) -> HandleId {
    match singleton::get(false) {
        Some(state) => state.handles().store(value),
        None => HandleId::NULL,
    }
}

/// Fetches from the live singleton's handle table; `None` when no singleton
/// is live. See [`HandleTable::fetch`] for the flag semantics.
pub fn fetch<T: Send + Sync + 'static>(
    id: HandleId,
    delete_entry: bool,
    assert_if_missing: bool,
) -> Option<Arc<T>> {
    let state = singleton::get(false)?;
    state.handles().fetch(id, delete_entry, assert_if_missing)
}

/// Removes from the live singleton's handle table; no-op when no singleton is
/// live.
pub fn remove(id: HandleId) {
    if let Some(state) = singleton::get(false) {
        state.handles().remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_store_fetch_round_trip() {
        let table = HandleTable::new();
        let id = table.store(Arc::new(41u64));
        assert!(!id.is_null());

        let value: Arc<u64> = table.fetch(id, true, true).unwrap();
        assert_eq!(*value, 41);

        // The deleting fetch removed the table's share.
        assert!(table.fetch::<u64>(id, true, false).is_none());
    }

    #[test]
    fn test_non_deleting_fetch_leaves_entry() {
        let table = HandleTable::new();
        let id = table.store(Arc::new("body".to_string()));

        let first: Arc<String> = table.fetch(id, false, true).unwrap();
        let second: Arc<String> = table.fetch(id, false, true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_keeps_value_alive() {
        let table = HandleTable::new();
        let value = Arc::new(vec![1u8, 2, 3]);
        let id = table.store(Arc::clone(&value));
        drop(value);

        let fetched: Arc<Vec<u8>> = table.fetch(id, true, true).unwrap();
        assert_eq!(*fetched, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_then_soft_fetch_misses() {
        let table = HandleTable::new();
        let id = table.store(Arc::new(1i32));
        table.remove(id);
        assert!(table.fetch::<i32>(id, true, false).is_none());
        table.remove(id); // no-op
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not found")]
    fn test_missing_handle_asserts() {
        let table = HandleTable::new();
        let _ = table.fetch::<i32>(HandleId(12345), true, true);
    }

    #[test]
    fn test_wrong_type_soft_fetch_keeps_entry() {
        let table = HandleTable::new();
        let id = table.store(Arc::new(5u32));

        assert!(table.fetch::<String>(id, true, false).is_none());
        // The mismatched fetch must not have consumed the entry.
        let value: Arc<u32> = table.fetch(id, true, true).unwrap();
        assert_eq!(*value, 5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "still live at cleanup")]
    fn test_drain_reports_leaked_handles() {
        let table = HandleTable::new();
        let _id = table.store(Arc::new(1u8));
        table.drain_and_assert_empty();
    }

    #[test]
    fn test_drain_on_empty_table_is_quiet() {
        let table = HandleTable::new();
        table.drain_and_assert_empty();
    }

    #[test]
    fn test_concurrent_store_yields_distinct_ids() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;

        let table = Arc::new(HandleTable::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|i| table.store(Arc::new((t, i))))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<HandleId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();

        // No lost entries, no duplicate identities.
        assert_eq!(ids.len(), THREADS * PER_THREAD);
        assert_eq!(table.len(), THREADS * PER_THREAD);
        for id in ids {
            assert!(table.fetch::<(usize, usize)>(id, true, true).is_some());
        }
        assert!(table.is_empty());
    }
}
