//! Error types for carrier-core.

use thiserror::Error;

/// Why ambient context could not be captured or installed.
///
/// These never reach the instrumented pipeline; callers degrade to "no
/// instrumentation" and at most log them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The thread-local store was already torn down (thread is exiting).
    #[error("ambient context is unavailable on this thread")]
    ContextUnavailable,

    /// The store is borrowed by an enclosing access on the same thread.
    #[error("ambient context is busy")]
    ContextBusy,

    /// A custom context provider failed.
    #[error("context provider failed: {0}")]
    Provider(String),
}
