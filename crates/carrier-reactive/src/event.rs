//! Observer events and the subscription handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

/// Cancellation handle handed to observers when they subscribe.
///
/// Clones share state. Instrumented wrappers forward it untouched.
#[derive(Debug, Clone, Default)]
pub struct Disposable {
    inner: Arc<DisposableInner>,
}

#[derive(Debug, Default)]
struct DisposableInner {
    disposed: AtomicBool,
    task: Mutex<Option<AbortHandle>>,
}

impl Disposable {
    /// Create a live handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the subscription. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut task) = self.inner.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }

    /// Whether the subscription was cancelled.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Whether both handles refer to the same subscription.
    pub fn same_subscription(&self, other: &Disposable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Tie a spawned task to this handle so disposing aborts it.
    pub(crate) fn attach(&self, task: AbortHandle) {
        if let Ok(mut slot) = self.inner.task.lock() {
            if self.is_disposed() {
                task.abort();
            } else {
                *slot = Some(task);
            }
        }
    }
}

/// An event delivered to a single-result observer.
#[derive(Debug)]
pub enum SingleEvent<T, E> {
    /// The subscription was acknowledged.
    Subscribed(Disposable),
    /// The operation failed.
    Failed(E),
    /// The operation produced a value.
    Succeeded(T),
}

/// An event delivered to an observer of an optional result.
#[derive(Debug)]
pub enum MaybeEvent<T, E> {
    /// The subscription was acknowledged.
    Subscribed(Disposable),
    /// The operation failed.
    Failed(E),
    /// The operation produced a value.
    Succeeded(T),
    /// The operation finished without a value.
    Completed,
}

/// An event delivered to an observer of a value-less operation.
#[derive(Debug)]
pub enum CompletableEvent<E> {
    /// The subscription was acknowledged.
    Subscribed(Disposable),
    /// The operation failed.
    Failed(E),
    /// The operation finished.
    Completed,
}

impl<T, E> SingleEvent<T, E> {
    /// Whether this event ends the subscription.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Subscribed(_))
    }
}

impl<T, E> MaybeEvent<T, E> {
    /// Whether this event ends the subscription.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Subscribed(_))
    }
}

impl<E> CompletableEvent<E> {
    /// Whether this event ends the subscription.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Subscribed(_))
    }
}
