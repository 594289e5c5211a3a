//! Capture instrumentation when an observer subscribes.

use std::fmt;
use std::sync::Arc;

use carrier_core::{
    CaptureSource, CompositeInstrumenterFactory, ContextPropagator, InstrumentationConfig,
};
use carrier_observability::{InstrumentationMetrics, MeteredFactory, SpanCapture};

use crate::instrumented::{
    InstrumentedCompletableObserver, InstrumentedMaybeObserver, InstrumentedSingleObserver,
};

/// The set of capture sources applied to every subscription.
///
/// Call the `instrument_*` methods on the subscribing thread: that is where
/// the ambient state is captured. The returned wrappers can then be moved
/// to whichever thread delivers events.
#[derive(Clone, Default)]
pub struct ReactiveInstrumentation {
    sources: Vec<Arc<dyn CaptureSource>>,
    metrics: Option<Arc<InstrumentationMetrics>>,
}

impl ReactiveInstrumentation {
    /// No capture sources; every callback is forwarded directly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard sources selected by `config`.
    pub fn from_config(config: &InstrumentationConfig) -> Self {
        let mut instrumentation = Self::new();
        if !config.enabled {
            return instrumentation;
        }

        let metrics = config.metrics_enabled().then(InstrumentationMetrics::new);

        if config.context_enabled() {
            let propagator = match &metrics {
                Some(metrics) => {
                    ContextPropagator::thread_local().with_failure_hook(metrics.failure_hook())
                }
                None => ContextPropagator::thread_local(),
            };
            instrumentation = instrumentation.with_source(propagator);
        }

        if config.spans_enabled() {
            instrumentation = instrumentation.with_source(SpanCapture);
        }

        instrumentation.metrics = metrics;
        instrumentation
    }

    /// Add a capture source. It is metered like the built-in ones.
    pub fn with_source(mut self, source: impl CaptureSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Record into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<InstrumentationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Counters, when metrics are enabled.
    pub fn metrics(&self) -> Option<&Arc<InstrumentationMetrics>> {
        self.metrics.as_ref()
    }

    /// Number of capture sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Snapshot every source on the calling thread.
    ///
    /// With metrics enabled this counts one subscription, and the sources
    /// are wrapped in a single [`MeteredFactory`] so each callback is
    /// counted once however many sources are active.
    pub fn capture(&self) -> CompositeInstrumenterFactory {
        let mut captured = CompositeInstrumenterFactory::new();
        for factory in self.sources.iter().filter_map(|source| source.capture()) {
            captured.push(factory);
        }

        match &self.metrics {
            Some(metrics) => {
                metrics.record_capture(!captured.is_empty());
                CompositeInstrumenterFactory::new()
                    .with(MeteredFactory::new(captured, Arc::clone(metrics)))
            }
            None => captured,
        }
    }

    /// Wrap a single-result observer with state captured now.
    pub fn instrument_single<O>(
        &self,
        observer: O,
    ) -> InstrumentedSingleObserver<O, CompositeInstrumenterFactory> {
        InstrumentedSingleObserver::new(observer, self.capture())
    }

    /// Wrap a maybe observer with state captured now.
    pub fn instrument_maybe<O>(
        &self,
        observer: O,
    ) -> InstrumentedMaybeObserver<O, CompositeInstrumenterFactory> {
        InstrumentedMaybeObserver::new(observer, self.capture())
    }

    /// Wrap a completable observer with state captured now.
    pub fn instrument_completable<O>(
        &self,
        observer: O,
    ) -> InstrumentedCompletableObserver<O, CompositeInstrumenterFactory> {
        InstrumentedCompletableObserver::new(observer, self.capture())
    }
}

impl fmt::Debug for ReactiveInstrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveInstrumentation")
            .field("sources", &self.sources.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_core::{
        from_fn, instrument, ExecutionContext, InvocationInstrumenter,
        InvocationInstrumenterFactory,
    };
    use tracing::Dispatch;

    struct Tick;

    impl InvocationInstrumenter for Tick {
        fn before_invocation(&mut self) {}

        fn after_invocation(&mut self) {}
    }

    /// A custom source that always captures.
    struct AlwaysCaptures;

    impl CaptureSource for AlwaysCaptures {
        fn capture(&self) -> Option<Box<dyn InvocationInstrumenterFactory>> {
            Some(Box::new(from_fn(
                || -> Option<Box<dyn InvocationInstrumenter>> { Some(Box::new(Tick)) },
            )))
        }
    }

    #[test]
    fn test_disabled_config_has_no_sources() {
        let instrumentation = ReactiveInstrumentation::from_config(&InstrumentationConfig::disabled());

        assert_eq!(instrumentation.source_count(), 0);
        assert!(instrumentation.metrics().is_none());
        assert!(instrumentation.capture().is_empty());
    }

    #[test]
    fn test_default_config_sources() {
        let instrumentation =
            ReactiveInstrumentation::from_config(&InstrumentationConfig::default());

        assert_eq!(instrumentation.source_count(), 2);
        assert!(instrumentation.metrics().is_some());
    }

    #[test]
    fn test_capture_with_context() {
        let config = InstrumentationConfig {
            propagate_spans: false,
            ..InstrumentationConfig::default()
        };
        let instrumentation = ReactiveInstrumentation::from_config(&config);

        let factory = ExecutionContext::new()
            .with_attribute("k", "v")
            .scope(|| instrumentation.capture());

        assert_eq!(factory.len(), 1);
        assert!(factory.create().is_some());

        let metrics = instrumentation.metrics().unwrap().snapshot();
        assert_eq!(metrics.captures, 1);
        assert_eq!(metrics.instrumenters_created, 1);
    }

    #[test]
    fn test_capture_without_context_is_absent() {
        let instrumentation =
            ReactiveInstrumentation::from_config(&InstrumentationConfig::default());

        let factory = instrumentation.capture();

        assert!(factory.create().is_none());
        assert_eq!(instrumentation.metrics().unwrap().snapshot().empty_captures, 1);
    }

    #[test]
    fn test_both_sources_count_once_per_subscription_and_callback() {
        let instrumentation =
            ReactiveInstrumentation::from_config(&InstrumentationConfig::default());
        let dispatch = Dispatch::new(tracing_subscriber::registry());

        let factory = tracing::dispatcher::with_default(&dispatch, || {
            let _checkout = tracing::info_span!("checkout").entered();
            ExecutionContext::new()
                .with_attribute("tenant", "acme")
                .scope(|| instrumentation.capture())
        });

        let seen = instrument(&factory, ExecutionContext::current);
        assert_eq!(seen.attribute("tenant"), Some("acme"));

        let metrics = instrumentation.metrics().unwrap().snapshot();
        assert_eq!(metrics.captures, 1);
        assert_eq!(metrics.empty_captures, 0);
        assert_eq!(metrics.instrumenters_created, 1);
        assert_eq!(metrics.brackets_opened, 1);
        assert_eq!(metrics.brackets_closed, 1);
        assert!(metrics.to_summary().contains("Callbacks: 1 bracketed, 0 direct"));
    }

    #[test]
    fn test_direct_callbacks_are_counted() {
        let instrumentation =
            ReactiveInstrumentation::from_config(&InstrumentationConfig::default());

        let factory = instrumentation.capture();
        for _ in 0..3 {
            instrument(&factory, || ());
        }

        let metrics = instrumentation.metrics().unwrap().snapshot();
        assert_eq!(metrics.empty_captures, 1);
        assert_eq!(metrics.direct_deliveries, 3);
        assert!(metrics.to_summary().contains("Callbacks: 0 bracketed, 3 direct"));
    }

    #[test]
    fn test_custom_sources_are_metered() {
        let config = InstrumentationConfig {
            propagate_context: false,
            propagate_spans: false,
            ..InstrumentationConfig::default()
        };
        let instrumentation =
            ReactiveInstrumentation::from_config(&config).with_source(AlwaysCaptures);

        let factory = instrumentation.capture();
        instrument(&factory, || ());

        let metrics = instrumentation.metrics().unwrap().snapshot();
        assert_eq!(instrumentation.source_count(), 1);
        assert_eq!(metrics.captures, 1);
        assert_eq!(metrics.instrumenters_created, 1);
        assert_eq!(metrics.brackets_closed, 1);
    }

    #[test]
    fn test_with_metrics_on_a_bare_assembly() {
        let metrics = InstrumentationMetrics::new();
        let instrumentation = ReactiveInstrumentation::new()
            .with_source(AlwaysCaptures)
            .with_metrics(Arc::clone(&metrics));

        instrument(&instrumentation.capture(), || ());

        assert_eq!(metrics.snapshot().captures, 1);
        assert_eq!(metrics.snapshot().brackets_opened, 1);
    }
}
