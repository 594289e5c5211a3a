//! Invocation instrumenter contract and factories.

use std::fmt;
use std::sync::Arc;

/// A per-invocation token that brackets a unit of work.
///
/// Each instrumenter is created for exactly one callback delivery.
/// `before_invocation` and `after_invocation` are each called once, in that
/// order, on the thread running the callback. Instrumenters are never shared
/// between threads, so the trait does not require `Send`.
pub trait InvocationInstrumenter {
    /// Called before the instrumented work runs.
    fn before_invocation(&mut self);

    /// Called after the instrumented work ran, including when it panicked.
    fn after_invocation(&mut self);
}

/// Produces instrumenters on demand.
///
/// `create` must be cheap, must not panic, and must not mutate ambient state.
/// Returning `None` means "no instrumentation active, forward directly".
pub trait InvocationInstrumenterFactory: Send + Sync {
    /// Create an instrumenter for the next invocation, if any is needed.
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>>;
}

/// Wrap a closure as a factory.
pub fn from_fn<F>(f: F) -> FnInstrumenterFactory<F>
where
    F: Fn() -> Option<Box<dyn InvocationInstrumenter>> + Send + Sync,
{
    FnInstrumenterFactory(f)
}

/// A factory backed by a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnInstrumenterFactory<F>(F);

impl<F> fmt::Debug for FnInstrumenterFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnInstrumenterFactory")
    }
}

impl<F> InvocationInstrumenterFactory for FnInstrumenterFactory<F>
where
    F: Fn() -> Option<Box<dyn InvocationInstrumenter>> + Send + Sync,
{
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        (self.0)()
    }
}

impl<F: InvocationInstrumenterFactory + ?Sized> InvocationInstrumenterFactory for Arc<F> {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        (**self).create()
    }
}

impl<F: InvocationInstrumenterFactory + ?Sized> InvocationInstrumenterFactory for Box<F> {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        (**self).create()
    }
}

impl<F: InvocationInstrumenterFactory + ?Sized> InvocationInstrumenterFactory for &F {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        (**self).create()
    }
}

/// A factory that never instruments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumenterFactory;

impl InvocationInstrumenterFactory for NoopInstrumenterFactory {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        None
    }
}

/// Combines several factories into one.
///
/// Members that return `None` are skipped. When more than one member is
/// active the resulting instrumenter begins in registration order and ends
/// in reverse order.
#[derive(Clone, Default)]
pub struct CompositeInstrumenterFactory {
    factories: Vec<Arc<dyn InvocationInstrumenterFactory>>,
}

impl CompositeInstrumenterFactory {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Add a factory.
    pub fn push(&mut self, factory: impl InvocationInstrumenterFactory + 'static) {
        self.factories.push(Arc::new(factory));
    }

    /// Add a factory (builder style).
    pub fn with(mut self, factory: impl InvocationInstrumenterFactory + 'static) -> Self {
        self.push(factory);
        self
    }

    /// Number of member factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether there are no member factories.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for CompositeInstrumenterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeInstrumenterFactory")
            .field("factories", &self.factories.len())
            .finish()
    }
}

impl InvocationInstrumenterFactory for CompositeInstrumenterFactory {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        let mut active: Vec<Box<dyn InvocationInstrumenter>> =
            self.factories.iter().filter_map(|f| f.create()).collect();

        match active.len() {
            0 => None,
            1 => active.pop(),
            _ => Some(Box::new(CompositeInstrumenter {
                members: active,
                started: 0,
            })),
        }
    }
}

/// Runs several instrumenters as one bracket.
struct CompositeInstrumenter {
    members: Vec<Box<dyn InvocationInstrumenter>>,
    // Number of members whose before hook ran; only those are ended.
    started: usize,
}

impl InvocationInstrumenter for CompositeInstrumenter {
    fn before_invocation(&mut self) {
        for member in &mut self.members {
            member.before_invocation();
            self.started += 1;
        }
    }

    fn after_invocation(&mut self) {
        for member in self.members[..self.started].iter_mut().rev() {
            member.after_invocation();
        }
        self.started = 0;
    }
}
