//! The platform transport context owned by the singleton.
//!
//! Actual socket/TLS I/O lives behind this trait in a platform-specific crate.
//! This core consumes the context purely as an opaque owned resource: it is
//! constructed during [`crate::init`], kept alive for the singleton's lifetime,
//! and released when the last reference to the singleton drops after
//! [`crate::cleanup`].

use std::error::Error;
use std::fmt;

/// Opaque platform-specific transport state.
///
/// Implementations typically wrap an OS HTTP stack handle or a connection
/// pool. The core never calls into the context; it only owns it so that
/// transport state and client state share one lifecycle.
pub trait PlatformContext: Send + Sync + fmt::Debug {}

/// Error type a platform context constructor may fail with.
pub type PlatformError = Box<dyn Error + Send + Sync>;
