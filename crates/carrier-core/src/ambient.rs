//! Explicit accessor over ambient execution state.

use crate::context::ExecutionContext;
use crate::error::CaptureError;

/// Reads and swaps some kind of ambient state.
///
/// Propagation only needs two operations: take a snapshot on the
/// subscribing thread, and swap a snapshot in (getting back whatever was
/// installed) on the callback thread. Begin/end pairs call `swap` twice:
/// once with the captured snapshot, once with the returned previous value.
pub trait AmbientContext: Send + Sync + 'static {
    /// Captured state.
    type Snapshot: Clone + Send + Sync + 'static;

    /// Snapshot the current state. `Ok(None)` means nothing to propagate.
    ///
    /// Must not mutate the ambient state.
    fn capture(&self) -> Result<Option<Self::Snapshot>, CaptureError>;

    /// Install `snapshot` and return the state it replaced.
    fn swap(&self, snapshot: Self::Snapshot) -> Result<Self::Snapshot, CaptureError>;
}

/// The per-thread [`ExecutionContext`] store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalContext;

impl AmbientContext for ThreadLocalContext {
    type Snapshot = ExecutionContext;

    fn capture(&self) -> Result<Option<ExecutionContext>, CaptureError> {
        let current = ExecutionContext::try_current()?;
        Ok((!current.is_empty()).then_some(current))
    }

    fn swap(&self, snapshot: ExecutionContext) -> Result<ExecutionContext, CaptureError> {
        ExecutionContext::replace_current(snapshot)
    }
}
