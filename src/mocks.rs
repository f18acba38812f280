//! Mock-response injection for tests.
//!
//! Test harnesses program fake responses here so network behavior can be
//! replaced deterministically without touching production dispatch code. The
//! registry is consulted by dispatch only when enabled; matching itself is a
//! caller-supplied predicate, keeping URL/template semantics out of this core.

use std::sync::Arc;

use parking_lot::Mutex;

/// A programmed fake response.
///
/// `method` and `url` are the template the harness matches against; empty
/// strings conventionally mean "match any". The response fields are returned
/// to the caller verbatim when this mock wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mock {
    pub method: String,
    pub url: String,
    pub status_code: u32,
    pub response_body: Vec<u8>,
    pub response_headers: Vec<(String, String)>,
}

#[derive(Default)]
struct MockState {
    mocks: Vec<Arc<Mock>>,
    last_matched: Option<Arc<Mock>>,
    enabled: bool,
}

/// Ordered list of programmed responses plus the enablement flag and the
/// last-match pointer.
#[derive(Default)]
pub struct MockRegistry {
    state: Mutex<MockState>,
}

impl MockRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Gates whether [`find_match`](Self::find_match) attempts matching at
    /// all.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Appends a mock. Matching order is registration order.
    pub fn add_mock(&self, mock: Arc<Mock>) {
        self.state.lock().mocks.push(mock);
    }

    /// Drops all programmed mocks and resets the last-match pointer.
    pub fn clear_mocks(&self) {
        let mut state = self.state.lock();
        state.mocks.clear();
        state.last_matched = None;
    }

    /// First-match-wins scan in registration order.
    ///
    /// Returns `None` without scanning when the registry is disabled. The
    /// predicate runs with the registry lock released, so it may inspect the
    /// registry itself. The winner is recorded as the last matched mock.
    pub fn find_match<F>(&self, matches: F) -> Option<Arc<Mock>>
    where
        F: Fn(&Mock) -> bool,
    {
        let snapshot: Vec<Arc<Mock>> = {
            let state = self.state.lock();
            if !state.enabled {
                return None;
            }
            state.mocks.clone()
        };

        let winner = snapshot.into_iter().find(|mock| matches(mock))?;
        self.state.lock().last_matched = Some(Arc::clone(&winner));
        Some(winner)
    }

    /// The most recent mock selected to satisfy a call, for introspection.
    pub fn last_matched(&self) -> Option<Arc<Mock>> {
        self.state.lock().last_matched.clone()
    }
}
