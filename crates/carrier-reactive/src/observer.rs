//! Observer traits.
//!
//! Each trait has one method per event plus `on_event`, which dispatches a
//! tagged event to those methods. Wrappers override `on_event` so all of
//! their logic sits in one place.

use crate::event::{CompletableEvent, Disposable, MaybeEvent, SingleEvent};

/// Consumer of a single-result operation.
pub trait SingleObserver<T, E> {
    /// The subscription was acknowledged.
    fn on_subscribe(&mut self, disposable: Disposable);

    /// The operation failed.
    fn on_error(&mut self, error: E);

    /// The operation produced a value.
    fn on_success(&mut self, value: T);

    /// Dispatch a tagged event.
    fn on_event(&mut self, event: SingleEvent<T, E>) {
        match event {
            SingleEvent::Subscribed(d) => self.on_subscribe(d),
            SingleEvent::Failed(e) => self.on_error(e),
            SingleEvent::Succeeded(v) => self.on_success(v),
        }
    }
}

/// Consumer of an operation that yields at most one value.
pub trait MaybeObserver<T, E> {
    /// The subscription was acknowledged.
    fn on_subscribe(&mut self, disposable: Disposable);

    /// The operation failed.
    fn on_error(&mut self, error: E);

    /// The operation produced a value.
    fn on_success(&mut self, value: T);

    /// The operation finished without a value.
    fn on_complete(&mut self);

    /// Dispatch a tagged event.
    fn on_event(&mut self, event: MaybeEvent<T, E>) {
        match event {
            MaybeEvent::Subscribed(d) => self.on_subscribe(d),
            MaybeEvent::Failed(e) => self.on_error(e),
            MaybeEvent::Succeeded(v) => self.on_success(v),
            MaybeEvent::Completed => self.on_complete(),
        }
    }
}

/// Consumer of an operation that only signals completion.
pub trait CompletableObserver<E> {
    /// The subscription was acknowledged.
    fn on_subscribe(&mut self, disposable: Disposable);

    /// The operation failed.
    fn on_error(&mut self, error: E);

    /// The operation finished.
    fn on_complete(&mut self);

    /// Dispatch a tagged event.
    fn on_event(&mut self, event: CompletableEvent<E>) {
        match event {
            CompletableEvent::Subscribed(d) => self.on_subscribe(d),
            CompletableEvent::Failed(e) => self.on_error(e),
            CompletableEvent::Completed => self.on_complete(),
        }
    }
}

impl<T, E, O: SingleObserver<T, E> + ?Sized> SingleObserver<T, E> for &mut O {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_success(&mut self, value: T) {
        (**self).on_success(value)
    }

    fn on_event(&mut self, event: SingleEvent<T, E>) {
        (**self).on_event(event)
    }
}

impl<T, E, O: SingleObserver<T, E> + ?Sized> SingleObserver<T, E> for Box<O> {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_success(&mut self, value: T) {
        (**self).on_success(value)
    }

    fn on_event(&mut self, event: SingleEvent<T, E>) {
        (**self).on_event(event)
    }
}

impl<T, E, O: MaybeObserver<T, E> + ?Sized> MaybeObserver<T, E> for &mut O {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_success(&mut self, value: T) {
        (**self).on_success(value)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_event(&mut self, event: MaybeEvent<T, E>) {
        (**self).on_event(event)
    }
}

impl<T, E, O: MaybeObserver<T, E> + ?Sized> MaybeObserver<T, E> for Box<O> {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_success(&mut self, value: T) {
        (**self).on_success(value)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_event(&mut self, event: MaybeEvent<T, E>) {
        (**self).on_event(event)
    }
}

impl<E, O: CompletableObserver<E> + ?Sized> CompletableObserver<E> for &mut O {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_event(&mut self, event: CompletableEvent<E>) {
        (**self).on_event(event)
    }
}

impl<E, O: CompletableObserver<E> + ?Sized> CompletableObserver<E> for Box<O> {
    fn on_subscribe(&mut self, disposable: Disposable) {
        (**self).on_subscribe(disposable)
    }

    fn on_error(&mut self, error: E) {
        (**self).on_error(error)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_event(&mut self, event: CompletableEvent<E>) {
        (**self).on_event(event)
    }
}
