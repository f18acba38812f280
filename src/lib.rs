//! # httpc-core
//!
//! Process-wide shared state for an HTTP/WebSocket client library.
//!
//! Every outstanding call, retry decision, diagnostic hook, and test mock
//! consults one reference-counted singleton. This crate owns that singleton
//! and its four subsystems; the actual socket I/O, HTTP parsing, and
//! WebSocket framing live behind the [`PlatformContext`] boundary in
//! platform-specific crates.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use httpc_core::{PlatformContext, RetryAfterState};
//!
//! #[derive(Debug)]
//! struct NullContext;
//! impl PlatformContext for NullContext {}
//!
//! httpc_core::init(|| Ok(Box::new(NullContext))).unwrap();
//!
//! let state = httpc_core::get(true).unwrap();
//! state.retry_after().set_retry_state(
//!     0xC0FFEE,
//!     RetryAfterState::new(Instant::now() + Duration::from_secs(30), 429),
//! );
//! assert_eq!(state.retry_after().get_retry_state(0xC0FFEE).status_code, 429);
//!
//! httpc_core::cleanup();
//! assert!(httpc_core::get(false).is_none());
//! ```
//!
//! ## Subsystems
//!
//! - [`HandleTable`]: type-erased shared-ownership store; hands internal
//!   objects out as opaque [`HandleId`] tokens.
//! - [`RetryAfterCache`]: per-identity "do not retry before T" records.
//! - [`ObserverRegistry`]: call-completion callbacks for diagnostics.
//! - [`MockRegistry`]: programmed fake responses for tests.
//!
//! Each subsystem has its own lock; none is ever held together with another
//! or with the creation lock, so lifecycle changes and routine access cannot
//! deadlock.
//!
//! ## Error model
//!
//! Expected absences (not yet initialized, handle already released, retry
//! record missing) are `Option`s or zero-valued defaults: never panics,
//! never `Result`s a caller could ignore. Genuine caller bugs (asserting a
//! singleton exists when it does not, leaking handles past [`cleanup`]) are
//! fatal invariant violations: a panic in debug builds, an error log in
//! release builds.

mod error;
mod mocks;
mod observers;
mod platform;
mod retry;
mod singleton;

pub mod handles;

pub use error::InitError;
pub use handles::{HandleId, HandleTable};
pub use mocks::{Mock, MockRegistry};
pub use observers::{CallObserver, CallRecord, ObserverRegistry, ObserverToken};
pub use platform::{PlatformContext, PlatformError};
pub use retry::{RetryAfterCache, RetryAfterState};
pub use singleton::{cleanup, get, init, ClientConfig, HttpSingleton};
