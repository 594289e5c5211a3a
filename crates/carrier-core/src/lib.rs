//! Core abstractions for propagating ambient context across asynchronous callbacks.
//!
//! This crate provides:
//! - `InvocationInstrumenter` / `InvocationInstrumenterFactory` - the per-callback bracket contract
//! - `instrument` / `InvocationGuard` - scoped begin/end bracketing
//! - `ExecutionContext` - per-thread trace, principal and baggage
//! - `ContextPropagator` - capture at subscription, restore around callbacks
//! - `InstrumentationConfig` - which instrumentation is applied

mod ambient;
mod bracket;
mod config;
mod context;
mod error;
mod instrument;
mod propagation;
mod trace;

pub use ambient::*;
pub use bracket::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use instrument::*;
pub use propagation::*;
pub use trace::*;
