//! Observer wrappers that bracket every delivered event.
//!
//! Each event asks the factory for a fresh instrumenter. With none the
//! event goes straight to the delegate; otherwise the delegate runs between
//! the instrumenter's begin and end hooks. The wrappers never inspect or
//! reorder events and never catch delegate panics.

use carrier_core::{instrument, InvocationInstrumenterFactory};

use crate::event::{CompletableEvent, Disposable, MaybeEvent, SingleEvent};
use crate::observer::{CompletableObserver, MaybeObserver, SingleObserver};

/// Instrumented [`SingleObserver`].
#[derive(Debug)]
pub struct InstrumentedSingleObserver<O, F> {
    delegate: O,
    factory: F,
}

impl<O, F> InstrumentedSingleObserver<O, F> {
    /// Wrap `delegate`.
    pub fn new(delegate: O, factory: F) -> Self {
        Self { delegate, factory }
    }

    /// The wrapped observer.
    pub fn delegate(&self) -> &O {
        &self.delegate
    }

    /// Unwrap the observer.
    pub fn into_inner(self) -> O {
        self.delegate
    }
}

impl<T, E, O, F> SingleObserver<T, E> for InstrumentedSingleObserver<O, F>
where
    O: SingleObserver<T, E>,
    F: InvocationInstrumenterFactory,
{
    fn on_subscribe(&mut self, disposable: Disposable) {
        self.on_event(SingleEvent::<T, E>::Subscribed(disposable));
    }

    fn on_error(&mut self, error: E) {
        self.on_event(SingleEvent::<T, E>::Failed(error));
    }

    fn on_success(&mut self, value: T) {
        self.on_event(SingleEvent::<T, E>::Succeeded(value));
    }

    fn on_event(&mut self, event: SingleEvent<T, E>) {
        let delegate = &mut self.delegate;
        instrument(&self.factory, || delegate.on_event(event));
    }
}

/// Instrumented [`MaybeObserver`].
#[derive(Debug)]
pub struct InstrumentedMaybeObserver<O, F> {
    delegate: O,
    factory: F,
}

impl<O, F> InstrumentedMaybeObserver<O, F> {
    /// Wrap `delegate`.
    pub fn new(delegate: O, factory: F) -> Self {
        Self { delegate, factory }
    }

    /// The wrapped observer.
    pub fn delegate(&self) -> &O {
        &self.delegate
    }

    /// Unwrap the observer.
    pub fn into_inner(self) -> O {
        self.delegate
    }
}

impl<T, E, O, F> MaybeObserver<T, E> for InstrumentedMaybeObserver<O, F>
where
    O: MaybeObserver<T, E>,
    F: InvocationInstrumenterFactory,
{
    fn on_subscribe(&mut self, disposable: Disposable) {
        self.on_event(MaybeEvent::<T, E>::Subscribed(disposable));
    }

    fn on_error(&mut self, error: E) {
        self.on_event(MaybeEvent::<T, E>::Failed(error));
    }

    fn on_success(&mut self, value: T) {
        self.on_event(MaybeEvent::<T, E>::Succeeded(value));
    }

    fn on_complete(&mut self) {
        self.on_event(MaybeEvent::<T, E>::Completed);
    }

    fn on_event(&mut self, event: MaybeEvent<T, E>) {
        let delegate = &mut self.delegate;
        instrument(&self.factory, || delegate.on_event(event));
    }
}

/// Instrumented [`CompletableObserver`].
#[derive(Debug)]
pub struct InstrumentedCompletableObserver<O, F> {
    delegate: O,
    factory: F,
}

impl<O, F> InstrumentedCompletableObserver<O, F> {
    /// Wrap `delegate`.
    pub fn new(delegate: O, factory: F) -> Self {
        Self { delegate, factory }
    }

    /// The wrapped observer.
    pub fn delegate(&self) -> &O {
        &self.delegate
    }

    /// Unwrap the observer.
    pub fn into_inner(self) -> O {
        self.delegate
    }
}

impl<E, O, F> CompletableObserver<E> for InstrumentedCompletableObserver<O, F>
where
    O: CompletableObserver<E>,
    F: InvocationInstrumenterFactory,
{
    fn on_subscribe(&mut self, disposable: Disposable) {
        self.on_event(CompletableEvent::<E>::Subscribed(disposable));
    }

    fn on_error(&mut self, error: E) {
        self.on_event(CompletableEvent::<E>::Failed(error));
    }

    fn on_complete(&mut self) {
        self.on_event(CompletableEvent::<E>::Completed);
    }

    fn on_event(&mut self, event: CompletableEvent<E>) {
        let delegate = &mut self.delegate;
        instrument(&self.factory, || delegate.on_event(event));
    }
}
