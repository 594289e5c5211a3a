//! A single-result source driven by a tokio runtime.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;

use crate::assembly::ReactiveInstrumentation;
use crate::event::Disposable;
use crate::observer::SingleObserver;

/// A deferred operation producing one value or one error.
///
/// Nothing runs until [`subscribe`](Single::subscribe) is called.
pub struct Single<T, E> {
    future: BoxFuture<'static, Result<T, E>>,
}

impl<T, E> Single<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create from a future.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            future: future.boxed(),
        }
    }

    /// A single that succeeds with `value`.
    pub fn just(value: T) -> Self {
        Self::from_future(async move { Ok(value) })
    }

    /// A single that fails with `error`.
    pub fn error(error: E) -> Self {
        Self::from_future(async move { Err(error) })
    }

    /// Subscribe `observer`.
    ///
    /// The subscription event is delivered on the calling thread before
    /// this returns. The operation then runs on `handle`, and the terminal
    /// event is delivered from whichever worker completes it, unless the
    /// returned handle was disposed first.
    pub fn subscribe<O>(self, mut observer: O, handle: &Handle) -> Disposable
    where
        O: SingleObserver<T, E> + Send + 'static,
    {
        let disposable = Disposable::new();
        observer.on_subscribe(disposable.clone());
        if disposable.is_disposed() {
            return disposable;
        }

        let subscription = disposable.clone();
        let future = self.future;
        let task = handle.spawn(async move {
            let result = future.await;
            if subscription.is_disposed() {
                return;
            }
            match result {
                Ok(value) => observer.on_success(value),
                Err(error) => observer.on_error(error),
            }
        });
        disposable.attach(task.abort_handle());

        disposable
    }

    /// Subscribe `observer` wrapped with state captured on the calling thread.
    pub fn subscribe_instrumented<O>(
        self,
        observer: O,
        instrumentation: &ReactiveInstrumentation,
        handle: &Handle,
    ) -> Disposable
    where
        O: SingleObserver<T, E> + Send + 'static,
    {
        let observer = instrumentation.instrument_single(observer);
        self.subscribe(observer, handle)
    }
}

impl<T, E> std::fmt::Debug for Single<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Single")
    }
}
