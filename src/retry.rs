//! Per-identity retry-after bookkeeping.
//!
//! When a call completes with a `Retry-After` header (or a status the retry
//! policy backs off on), the dispatch layer records "do not retry before T,
//! last status S" here under a caller-defined 32-bit identity, typically a
//! stable hash of the endpoint template. The cache itself knows nothing about
//! URLs or HTTP semantics; it is a pure key → timestamp store, which keeps it
//! decoupled from call dispatch and trivially testable.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

/// Last-known retry constraint for one call-site identity.
///
/// The default value is the "no active constraint" record: `ready_at` unset
/// and `status_code` zero. `Instant` has no zero value in Rust, so absence of
/// a timestamp is expressed as `None` rather than a sentinel time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryAfterState {
    /// Earliest point at which the call site may be retried.
    pub ready_at: Option<Instant>,
    /// Status code of the response that set this constraint (e.g. 429, 503).
    pub status_code: u32,
}

impl RetryAfterState {
    /// Builds a record constraining retries until `ready_at`.
    pub fn new(ready_at: Instant, status_code: u32) -> Self {
        RetryAfterState {
            ready_at: Some(ready_at),
            status_code,
        }
    }
}

/// Key → retry-after record table with its own lock.
///
/// At most one record per identity; `set` overwrites unconditionally.
#[derive(Debug, Default)]
pub struct RetryAfterCache {
    entries: Mutex<HashMap<u32, RetryAfterState>>,
}

impl RetryAfterCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Upserts the record for `id`.
    pub fn set_retry_state(&self, id: u32, state: RetryAfterState) {
        self.entries.lock().insert(id, state);
    }

    /// Returns the record for `id`, or the zero-valued default if absent.
    ///
    /// Absence is meaningful ("no active retry-after constraint"), so this
    /// never fails.
    pub fn get_retry_state(&self, id: u32) -> RetryAfterState {
        self.entries.lock().get(&id).copied().unwrap_or_default()
    }

    /// Removes the record for `id` if present; no-op otherwise.
    pub fn clear_retry_state(&self, id: u32) {
        self.entries.lock().remove(&id);
    }
}
