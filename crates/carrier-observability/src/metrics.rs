//! Counters for captures, capture failures and brackets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use carrier_core::{
    CaptureError, CaptureFailureHook, InvocationInstrumenter, InvocationInstrumenterFactory,
};
use serde::{Deserialize, Serialize};

/// Process-wide instrumentation counters.
///
/// Recording is advisory: nothing here changes whether or how a callback
/// is instrumented.
#[derive(Debug, Default)]
pub struct InstrumentationMetrics {
    captures: AtomicU64,
    empty_captures: AtomicU64,
    capture_failures: AtomicU64,
    instrumenters_created: AtomicU64,
    direct_deliveries: AtomicU64,
    brackets_opened: AtomicU64,
    brackets_closed: AtomicU64,
}

/// Point-in-time copy of [`InstrumentationMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Subscriptions whose context was captured.
    pub captures: u64,
    /// Subscriptions with nothing to capture.
    pub empty_captures: u64,
    /// Captures that failed and degraded to no instrumentation.
    pub capture_failures: u64,
    /// Instrumenters handed out.
    pub instrumenters_created: u64,
    /// Callbacks forwarded without a bracket.
    pub direct_deliveries: u64,
    /// Begin hooks run.
    pub brackets_opened: u64,
    /// End hooks run.
    pub brackets_closed: u64,
}

impl InstrumentationMetrics {
    /// Create a shared, zeroed set of counters.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A hook for [`ContextPropagator::with_failure_hook`](carrier_core::ContextPropagator::with_failure_hook).
    pub fn failure_hook(self: &Arc<Self>) -> CaptureFailureHook {
        let metrics = Arc::clone(self);
        Arc::new(move |_: &CaptureError| metrics.record_capture_failure())
    }

    /// Record a capture failure.
    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one subscription. `captured` is whether any source captured state.
    pub fn record_capture(&self, captured: bool) {
        let counter = if captured {
            &self.captures
        } else {
            &self.empty_captures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            captures: self.captures.load(Ordering::Relaxed),
            empty_captures: self.empty_captures.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            instrumenters_created: self.instrumenters_created.load(Ordering::Relaxed),
            direct_deliveries: self.direct_deliveries.load(Ordering::Relaxed),
            brackets_opened: self.brackets_opened.load(Ordering::Relaxed),
            brackets_closed: self.brackets_closed.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Brackets begun but not yet ended.
    pub fn open_brackets(&self) -> u64 {
        self.brackets_opened.saturating_sub(self.brackets_closed)
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Instrumentation:".to_string());
        lines.push(format!(
            "  Captures: {} ({} empty, {} failed)",
            self.captures, self.empty_captures, self.capture_failures
        ));
        lines.push(format!(
            "  Callbacks: {} bracketed, {} direct",
            self.instrumenters_created, self.direct_deliveries
        ));
        lines.push(format!(
            "  Brackets: {} opened, {} closed",
            self.brackets_opened, self.brackets_closed
        ));

        if self.open_brackets() > 0 {
            lines.push(format!("  Open brackets: {}", self.open_brackets()));
        }

        lines.join("\n")
    }
}

/// Counts callbacks delivered through an inner factory.
///
/// Wrap the whole per-subscription factory, not each member, so every
/// callback is counted exactly once: as bracketed when the inner factory
/// hands out an instrumenter, as direct otherwise.
pub struct MeteredFactory<F> {
    inner: F,
    metrics: Arc<InstrumentationMetrics>,
}

impl<F: InvocationInstrumenterFactory> MeteredFactory<F> {
    /// Wrap `inner`.
    pub fn new(inner: F, metrics: Arc<InstrumentationMetrics>) -> Self {
        Self { inner, metrics }
    }
}

impl<F: InvocationInstrumenterFactory> InvocationInstrumenterFactory for MeteredFactory<F> {
    fn create(&self) -> Option<Box<dyn InvocationInstrumenter>> {
        match self.inner.create() {
            Some(inner) => {
                self.metrics
                    .instrumenters_created
                    .fetch_add(1, Ordering::Relaxed);
                Some(Box::new(MeteredInstrumenter {
                    inner,
                    metrics: Arc::clone(&self.metrics),
                }))
            }
            None => {
                self.metrics.direct_deliveries.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

struct MeteredInstrumenter {
    inner: Box<dyn InvocationInstrumenter>,
    metrics: Arc<InstrumentationMetrics>,
}

impl InvocationInstrumenter for MeteredInstrumenter {
    fn before_invocation(&mut self) {
        self.metrics.brackets_opened.fetch_add(1, Ordering::Relaxed);
        self.inner.before_invocation();
    }

    fn after_invocation(&mut self) {
        self.inner.after_invocation();
        self.metrics.brackets_closed.fetch_add(1, Ordering::Relaxed);
    }
}
