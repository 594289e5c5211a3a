//! Re-enter the subscriber's `tracing` span around callbacks.

use carrier_core::{CaptureSource, InvocationInstrumenter, InvocationInstrumenterFactory};
use tracing::span::EnteredSpan;
use tracing::Span;

/// Captures `tracing::Span::current()` at subscription time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanCapture;

impl SpanCapture {
    /// Capture the current span. Disabled spans capture nothing.
    pub fn capture_current(&self) -> Option<CapturedSpan> {
        let span = Span::current();
        if span.is_disabled() {
            return None;
        }
        Some(CapturedSpan { span })
    }
}

impl CaptureSource for SpanCapture {
    fn capture(&self) -> Option<Box<dyn InvocationInstrumenterFactory>> {
        self.capture_current()
            .map(|captured| Box::new(captured) as Box<dyn InvocationInstrumenterFactory>)
    }
}

/// A span captured at subscription time.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    span: Span,
}

impl CapturedSpan {
    /// The captured span.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl InvocationInstrumenterFactory for CapturedSpan {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        Some(Box::new(SpanInstrumenter {
            span: self.span.clone(),
            entered: None,
        }))
    }
}

/// Enters the captured span for one callback.
struct SpanInstrumenter {
    span: Span,
    entered: Option<EnteredSpan>,
}

impl InvocationInstrumenter for SpanInstrumenter {
    fn before_invocation(&mut self) {
        self.entered = Some(self.span.clone().entered());
    }

    fn after_invocation(&mut self) {
        // Dropping the guard exits the span.
        self.entered.take();
    }
}
