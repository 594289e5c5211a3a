//! Observability for instrumented callbacks.
//!
//! This crate provides:
//! - `SpanCapture` - re-enter the subscriber's `tracing` span around callbacks
//! - `InstrumentationMetrics` - capture and bracket counters
//! - `ContextLogger` - structured logs correlated with the execution context

mod logging;
mod metrics;
mod span;

pub use logging::*;
pub use metrics::*;
pub use span::*;
