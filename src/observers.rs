//! Call-routed observer registry.
//!
//! Diagnostics and telemetry layers subscribe here to see every completed
//! call without being wired into dispatch itself. The dispatch machinery
//! calls [`ObserverRegistry::notify_all`] once per completed call.
//!
//! Observers are trait objects: whatever state the callback needs travels
//! inside the observer itself, and the registry's `Arc` shares guarantee a
//! concurrently removed observer is never invoked after its state is freed.
//! Plain closures implement [`CallObserver`] through a blanket impl.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Summary of one completed call, delivered to every registered observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Per-process call id, issued by [`crate::HttpSingleton::next_call_id`].
    pub id: u64,
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Final response status code, or 0 if the call failed before a response.
    pub status_code: u32,
}

/// A diagnostics callback invoked on call completion.
///
/// Notification runs on the call-completion thread; implementations must not
/// block indefinitely.
pub trait CallObserver: Send + Sync {
    fn on_call_routed(&self, call: &CallRecord);
}

impl<F> CallObserver for F
where
    F: Fn(&CallRecord) + Send + Sync,
{
    fn on_call_routed(&self, call: &CallRecord) {
        self(call)
    }
}

/// Subscription token returned by [`ObserverRegistry::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(i32);

/// Dynamic subscribe/unsubscribe list of call observers.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<(ObserverToken, Arc<dyn CallObserver>)>>,
    next_token: AtomicI32,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an observer and returns its removal token.
    ///
    /// Tokens come from an atomic counter: unique and monotonic for the
    /// process lifetime, regardless of concurrent registration.
    pub fn add_observer(&self, observer: Arc<dyn CallObserver>) -> ObserverToken {
        let token = ObserverToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((token, observer));
        token
    }

    /// Removes the observer registered under `token`; no-op if already
    /// removed.
    pub fn remove_observer(&self, token: ObserverToken) {
        self.observers.lock().retain(|(t, _)| *t != token);
    }

    /// Invokes every registered observer with `call`.
    ///
    /// Iterates a snapshot taken under the lock and invokes with the lock
    /// released, so observers may add or remove registrations from inside
    /// their callback. An observer added or removed while a notification is
    /// in flight may or may not see that notification; it will never be
    /// invoked after its `Arc` share is the registry's last and dropped
    /// mid-iteration, because the snapshot holds its own share.
    pub fn notify_all(&self, call: &CallRecord) {
        let snapshot: Vec<Arc<dyn CallObserver>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            observer.on_call_routed(call);
        }
    }

    #[cfg(test)]
    fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}
