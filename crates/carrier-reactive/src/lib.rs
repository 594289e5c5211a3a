//! Instrumented reactive observers.
//!
//! This crate provides:
//! - `SingleEvent` / `MaybeEvent` / `CompletableEvent` - tagged observer events
//! - `SingleObserver` / `MaybeObserver` / `CompletableObserver` - consumer traits
//! - `InstrumentedSingleObserver` and friends - bracket every delivered event
//! - `ReactiveInstrumentation` - capture ambient state at subscription
//! - `Single` - a tokio-driven single-result source

mod assembly;
mod event;
mod instrumented;
mod observer;
mod single;

pub use assembly::*;
pub use event::*;
pub use instrumented::*;
pub use observer::*;
pub use single::*;
