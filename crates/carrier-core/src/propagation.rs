//! Capture ambient context at subscription and restore it around callbacks.

use std::fmt;
use std::sync::Arc;

use crate::ambient::{AmbientContext, ThreadLocalContext};
use crate::error::CaptureError;
use crate::instrument::{InvocationInstrumenter, InvocationInstrumenterFactory};

/// Callback notified when a capture fails. Advisory only.
pub type CaptureFailureHook = Arc<dyn Fn(&CaptureError) + Send + Sync>;

/// Something that snapshots ambient state at subscription time.
///
/// The returned factory holds the snapshot and hands out a fresh
/// instrumenter per callback. `None` means there is nothing to propagate.
pub trait CaptureSource: Send + Sync {
    /// Snapshot the calling thread's state.
    fn capture(&self) -> Option<Box<dyn InvocationInstrumenterFactory>>;
}

/// Captures an [`AmbientContext`] and builds factories that restore it.
pub struct ContextPropagator<A: AmbientContext> {
    ambient: Arc<A>,
    on_failure: Option<CaptureFailureHook>,
}

impl ContextPropagator<ThreadLocalContext> {
    /// Propagate the per-thread [`ExecutionContext`](crate::ExecutionContext).
    pub fn thread_local() -> Self {
        Self::new(ThreadLocalContext)
    }
}

impl<A: AmbientContext> ContextPropagator<A> {
    /// Create a propagator over `ambient`.
    pub fn new(ambient: A) -> Self {
        Self {
            ambient: Arc::new(ambient),
            on_failure: None,
        }
    }

    /// Notify `hook` whenever a capture fails.
    pub fn with_failure_hook(mut self, hook: CaptureFailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    /// Snapshot the calling thread's ambient state.
    ///
    /// Never fails: a capture error is logged at debug level, reported to
    /// the failure hook, and yields an empty captured context.
    pub fn capture(&self) -> CapturedContext<A> {
        let snapshot = match self.ambient.capture() {
            Ok(snapshot) => snapshot.map(Arc::new),
            Err(error) => {
                tracing::debug!(%error, "ambient context capture failed, continuing uninstrumented");
                if let Some(hook) = &self.on_failure {
                    hook(&error);
                }
                None
            }
        };

        CapturedContext {
            ambient: Arc::clone(&self.ambient),
            snapshot,
        }
    }
}

impl<A: AmbientContext> Clone for ContextPropagator<A> {
    fn clone(&self) -> Self {
        Self {
            ambient: Arc::clone(&self.ambient),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<A: AmbientContext> fmt::Debug for ContextPropagator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPropagator")
            .field("ambient", &std::any::type_name::<A>())
            .field("has_failure_hook", &self.on_failure.is_some())
            .finish()
    }
}

impl<A: AmbientContext> CaptureSource for ContextPropagator<A> {
    fn capture(&self) -> Option<Box<dyn InvocationInstrumenterFactory>> {
        let captured = ContextPropagator::capture(self);
        if captured.is_empty() {
            None
        } else {
            Some(Box::new(captured))
        }
    }
}

/// A snapshot taken at subscription time.
///
/// Each `create` returns a new [`PropagatingInstrumenter`] sharing the
/// immutable snapshot, so concurrent deliveries never share mutable state.
pub struct CapturedContext<A: AmbientContext> {
    ambient: Arc<A>,
    snapshot: Option<Arc<A::Snapshot>>,
}

impl<A: AmbientContext> CapturedContext<A> {
    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
    }

    /// The captured snapshot, if any.
    pub fn snapshot(&self) -> Option<&A::Snapshot> {
        self.snapshot.as_deref()
    }
}

impl<A: AmbientContext> Clone for CapturedContext<A> {
    fn clone(&self) -> Self {
        Self {
            ambient: Arc::clone(&self.ambient),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<A: AmbientContext> fmt::Debug for CapturedContext<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedContext")
            .field("empty", &self.is_empty())
            .finish()
    }
}

impl<A: AmbientContext> InvocationInstrumenterFactory for CapturedContext<A> {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        let snapshot = self.snapshot.as_ref()?;
        Some(Box::new(PropagatingInstrumenter {
            ambient: Arc::clone(&self.ambient),
            snapshot: Arc::clone(snapshot),
            previous: None,
        }))
    }
}

/// Installs a captured snapshot for the duration of one callback.
pub struct PropagatingInstrumenter<A: AmbientContext> {
    ambient: Arc<A>,
    snapshot: Arc<A::Snapshot>,
    previous: Option<A::Snapshot>,
}

impl<A: AmbientContext> InvocationInstrumenter for PropagatingInstrumenter<A> {
    fn before_invocation(&mut self) {
        match self.ambient.swap((*self.snapshot).clone()) {
            Ok(previous) => self.previous = Some(previous),
            Err(error) => {
                tracing::debug!(%error, "could not install captured context");
            }
        }
    }

    fn after_invocation(&mut self) {
        // Nothing to restore if installation failed.
        let Some(previous) = self.previous.take() else {
            return;
        };
        if let Err(error) = self.ambient.swap(previous) {
            tracing::debug!(%error, "could not restore previous context");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::instrument;
    use crate::context::{ExecutionContext, Principal};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingContext;

    impl AmbientContext for FailingContext {
        type Snapshot = ();

        fn capture(&self) -> Result<Option<()>, CaptureError> {
            Err(CaptureError::Provider("store offline".to_string()))
        }

        fn swap(&self, _snapshot: ()) -> Result<(), CaptureError> {
            Err(CaptureError::Provider("store offline".to_string()))
        }
    }

    #[test]
    fn test_captures_and_restores_across_threads() {
        let propagator = ContextPropagator::thread_local();
        let origin = ExecutionContext::new()
            .with_principal(Principal::new("alice"))
            .with_attribute("tenant", "acme");

        let captured = origin.clone().scope(|| propagator.capture());
        assert_eq!(captured.snapshot(), Some(&origin));

        let (inside, after) = std::thread::spawn(move || {
            let _worker = ExecutionContext::new()
                .with_attribute("worker", "1")
                .enter();
            let inside = instrument(&captured, ExecutionContext::current);
            (inside, ExecutionContext::current())
        })
        .join()
        .unwrap();

        assert_eq!(inside, origin);
        assert_eq!(after.attribute("worker"), Some("1"));
        assert!(after.principal.is_none());
    }

    #[test]
    fn test_empty_context_yields_absent_instrumenter() {
        let captured = ContextPropagator::thread_local().capture();

        assert!(captured.is_empty());
        assert!(captured.create().is_none());
        assert!(CaptureSource::capture(&ContextPropagator::thread_local()).is_none());
    }

    #[test]
    fn test_capture_failure_degrades_to_absent() {
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let propagator = ContextPropagator::new(FailingContext).with_failure_hook(Arc::new(
            move |_: &CaptureError| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        let captured = propagator.capture();

        assert!(captured.create().is_none());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_each_create_is_a_fresh_instrumenter() {
        let propagator = ContextPropagator::thread_local();
        let origin = ExecutionContext::new().with_attribute("k", "v");
        let captured = origin.clone().scope(|| propagator.capture());

        for _ in 0..3 {
            let seen = instrument(&captured, ExecutionContext::current);
            assert_eq!(seen, origin);
            assert!(ExecutionContext::current().is_empty());
        }
    }

    #[test]
    fn test_concurrent_deliveries_share_no_state() {
        const WORKERS: usize = 4;

        let propagator = ContextPropagator::thread_local();
        let origin = ExecutionContext::new()
            .with_principal(Principal::new("alice"))
            .with_attribute("tenant", "acme");
        let captured = Arc::new(origin.clone().scope(|| propagator.capture()));
        let inside_together = Arc::new(std::sync::Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|i| {
                let captured = Arc::clone(&captured);
                let inside_together = Arc::clone(&inside_together);
                std::thread::spawn(move || {
                    let worker = ExecutionContext::new().with_attribute("worker", i.to_string());
                    let _worker = worker.clone().enter();
                    // Every thread is inside its bracket at the same time.
                    let inside = instrument(&captured, || {
                        inside_together.wait();
                        ExecutionContext::current()
                    });
                    (inside, ExecutionContext::current(), worker)
                })
            })
            .collect();

        for handle in handles {
            let (inside, after, worker) = handle.join().unwrap();
            assert_eq!(inside, origin);
            assert_eq!(after, worker);
        }
    }

    #[test]
    fn test_restores_after_panic() {
        let propagator = ContextPropagator::thread_local();
        let captured = ExecutionContext::new()
            .with_attribute("k", "v")
            .scope(|| propagator.capture());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            instrument(&captured, || panic!("callback failed"));
        }));

        assert!(result.is_err());
        assert!(ExecutionContext::current().is_empty());
    }
}
