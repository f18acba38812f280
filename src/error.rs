use std::error::Error;

use thiserror::Error;

/// Status returned by [`crate::init`].
///
/// Expected absences elsewhere in the crate are `Option`s; `init` is the one
/// operation with more than one distinct failure to report.
#[derive(Debug, Error)]
pub enum InitError {
    /// A live singleton already exists. The racing `init` that got here lost;
    /// the state it wanted to create is already available via [`crate::get`].
    #[error("client state is already initialized")]
    AlreadyInitialized,

    /// The platform transport context constructor failed. No singleton was
    /// created; a later `init` may retry.
    #[error("platform context construction failed")]
    PlatformContext(#[source] Box<dyn Error + Send + Sync>),
}

/// Reports a fatal precondition violation: a caller bug, not a runtime
/// condition to branch on.
///
/// Debug builds panic so the bug surfaces immediately in tests. Release builds
/// keep the error log and let the caller continue on the soft path; the
/// violation is never silently ignored.
///
/// Callers must not hold any registry lock when invoking this.
pub(crate) fn invariant_violation(message: &str) {
    tracing::error!("invariant violation: {message}");
    if cfg!(debug_assertions) {
        panic!("invariant violation: {message}");
    }
}
