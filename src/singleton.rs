//! The process-wide client state singleton and its lifecycle.
//!
//! At most one [`HttpSingleton`] is live at a time, held in a private global
//! slot behind the creation lock. Library entry points obtain it through
//! [`get`] and then use one subsystem under that subsystem's own lock; the
//! creation lock is never held together with a subsystem lock, so lifecycle
//! changes cannot deadlock against routine access.
//!
//! The singleton is handed out as `Arc<HttpSingleton>`: a caller holding a
//! reference keeps the state alive even if another thread runs [`cleanup`]
//! concurrently. Cleanup empties the global slot (new [`get`]s miss) and the
//! state itself is released when the last reference drops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{invariant_violation, InitError};
use crate::handles::HandleTable;
use crate::mocks::MockRegistry;
use crate::observers::ObserverRegistry;
use crate::platform::{PlatformContext, PlatformError};
use crate::retry::RetryAfterCache;

/// Configuration fields stored alongside the singleton.
///
/// These are read by the dispatch and retry layers outside this core; the
/// core only stores them. Defaults match the client's stock behavior: 30s
/// call timeout, 20s retry window, 2s base retry delay, retries allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout_secs: u32,
    pub retry_window_secs: u32,
    pub retry_delay_secs: u32,
    pub retry_allowed: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout_secs: 30,
            retry_window_secs: 20,
            retry_delay_secs: 2,
            retry_allowed: true,
        }
    }
}

/// Shared state consulted by every outstanding call, retry decision,
/// diagnostic hook, and test mock.
///
/// Each subsystem carries its own lock; no operation on this type acquires
/// more than one of them at a time.
pub struct HttpSingleton {
    platform_context: Box<dyn PlatformContext>,
    config: RwLock<ClientConfig>,
    retry_after: RetryAfterCache,
    handles: HandleTable,
    observers: ObserverRegistry,
    mocks: MockRegistry,
    last_call_id: AtomicU64,
}

impl HttpSingleton {
    fn new(platform_context: Box<dyn PlatformContext>) -> Self {
        HttpSingleton {
            platform_context,
            config: RwLock::new(ClientConfig::default()),
            retry_after: RetryAfterCache::new(),
            handles: HandleTable::new(),
            observers: ObserverRegistry::new(),
            mocks: MockRegistry::new(),
            last_call_id: AtomicU64::new(0),
        }
    }

    /// The owned platform transport context.
    pub fn platform_context(&self) -> &dyn PlatformContext {
        &*self.platform_context
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        *self.config.read()
    }

    /// Replaces the configuration.
    pub fn set_config(&self, config: ClientConfig) {
        *self.config.write() = config;
    }

    /// Issues the next call id: unique and monotonic for this singleton's
    /// lifetime, starting at 1. Lock-free.
    pub fn next_call_id(&self) -> u64 {
        self.last_call_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn retry_after(&self) -> &RetryAfterCache {
        &self.retry_after
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn mocks(&self) -> &MockRegistry {
        &self.mocks
    }
}

impl std::fmt::Debug for HttpSingleton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSingleton")
            .field("platform_context", &self.platform_context)
            .field("config", &*self.config.read())
            .field("live_handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}

/// Global slot holding the live singleton. Its mutex doubles as the
/// creation/teardown lock.
static SINGLETON: Mutex<Option<Arc<HttpSingleton>>> = Mutex::new(None);

/// Initializes the process-wide client state.
///
/// `platform` constructs the platform transport context; it runs under the
/// creation lock only after confirming no live singleton exists, so a failing
/// constructor leaves the process uninitialized and a later `init` may retry.
/// Concurrent `init` calls race safely to exactly one winner; losers get
/// [`InitError::AlreadyInitialized`].
pub fn init<F>(platform: F) -> Result<(), InitError>
where
    F: FnOnce() -> Result<Box<dyn PlatformContext>, PlatformError>,
{
    let mut slot = SINGLETON.lock();
    if slot.is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    let context = platform().map_err(InitError::PlatformContext)?;
    *slot = Some(Arc::new(HttpSingleton::new(context)));
    drop(slot);
    tracing::info!("client state initialized");
    Ok(())
}

/// Returns a shared reference to the live singleton, or `None`.
///
/// With `assert_if_null`, a missing singleton is a fatal precondition
/// violation: the caller was required to have initialized the library first.
/// Without it, "not yet started" is an ordinary state the caller branches on.
pub fn get(assert_if_null: bool) -> Option<Arc<HttpSingleton>> {
    let found = SINGLETON.lock().as_ref().map(Arc::clone);
    if found.is_none() && assert_if_null {
        invariant_violation("client state requested before init");
    }
    found
}

/// Tears the singleton down.
///
/// The slot is emptied first, so `get` misses from this point on; the handle
/// table is then swept. Finding it non-empty means a caller leaked a handle,
/// which is reported as a fatal invariant violation. The platform transport
/// context and all subsystem state are released when the last outstanding
/// reference drops, which is immediately here unless another thread still
/// holds one.
pub fn cleanup() {
    let taken = SINGLETON.lock().take();
    if let Some(state) = taken {
        state.handles().drain_and_assert_empty();
        tracing::info!("client state cleaned up");
    }
}
