//! Scoped begin/end bracketing around a unit of work.

use crate::instrument::{InvocationInstrumenter, InvocationInstrumenterFactory};

/// Holds an instrumenter between its begin and end hooks.
///
/// Creating the guard calls `before_invocation`; dropping it calls
/// `after_invocation`. Dropping also happens while unwinding, so the end
/// hook runs even when the bracketed work panics.
#[must_use = "the end hook runs when the guard is dropped"]
pub struct InvocationGuard {
    instrumenter: Box<dyn InvocationInstrumenter>,
}

impl InvocationGuard {
    /// Begin an invocation.
    pub fn begin(mut instrumenter: Box<dyn InvocationInstrumenter>) -> Self {
        instrumenter.before_invocation();
        Self { instrumenter }
    }
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        self.instrumenter.after_invocation();
    }
}

impl std::fmt::Debug for InvocationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InvocationGuard")
    }
}

/// Run `work` inside an instrumentation bracket.
///
/// Asks `factory` for an instrumenter. With none, `work` runs directly.
/// Otherwise `work` runs between the begin and end hooks. The return value
/// (including any `Err`) and any panic pass through unchanged; a panic
/// resumes only after the end hook ran.
pub fn instrument<F, R>(factory: &F, work: impl FnOnce() -> R) -> R
where
    F: InvocationInstrumenterFactory + ?Sized,
{
    match factory.create() {
        None => work(),
        Some(instrumenter) => {
            let _guard = InvocationGuard::begin(instrumenter);
            work()
        }
    }
}
