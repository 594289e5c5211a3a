//! Shared observers and factories for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use carrier_core::{
    from_fn, ExecutionContext, InvocationInstrumenter, InvocationInstrumenterFactory,
};
use carrier_reactive::{Disposable, SingleObserver};
use tokio::sync::mpsc::UnboundedSender;

/// Ordered record of hooks and delegate calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn count(log: &CallLog, entry: &str) -> usize {
    log.lock().unwrap().iter().filter(|e| *e == entry).count()
}

struct LoggingInstrumenter(CallLog);

impl InvocationInstrumenter for LoggingInstrumenter {
    fn before_invocation(&mut self) {
        self.0.lock().unwrap().push("begin".to_string());
    }

    fn after_invocation(&mut self) {
        self.0.lock().unwrap().push("end".to_string());
    }
}

/// A factory that always instruments, logging its hooks to `log`.
pub fn logging_factory(log: &CallLog) -> impl InvocationInstrumenterFactory + 'static {
    let log = Arc::clone(log);
    from_fn(move || -> Option<Box<dyn InvocationInstrumenter>> {
        Some(Box::new(LoggingInstrumenter(Arc::clone(&log))))
    })
}

/// Domain error used as the failure payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderError(pub String);

/// Logs each event it receives.
pub struct LoggingObserver {
    pub log: CallLog,
}

impl SingleObserver<u32, OrderError> for LoggingObserver {
    fn on_subscribe(&mut self, _disposable: Disposable) {
        self.log.lock().unwrap().push("subscribe".to_string());
    }

    fn on_error(&mut self, error: OrderError) {
        self.log.lock().unwrap().push(format!("error:{}", error.0));
    }

    fn on_success(&mut self, value: u32) {
        self.log.lock().unwrap().push(format!("success:{}", value));
    }
}

/// Panic payload raised by [`FailingObserver`].
#[derive(Debug, PartialEq, Eq)]
pub struct HandlerFailure(pub &'static str);

/// Logs each event, then panics with [`HandlerFailure`].
pub struct FailingObserver {
    pub log: CallLog,
}

impl SingleObserver<u32, OrderError> for FailingObserver {
    fn on_subscribe(&mut self, _disposable: Disposable) {
        self.log.lock().unwrap().push("subscribe".to_string());
        std::panic::panic_any(HandlerFailure("subscribe handler failed"));
    }

    fn on_error(&mut self, error: OrderError) {
        self.log.lock().unwrap().push(format!("error:{}", error.0));
        std::panic::panic_any(HandlerFailure("error handler failed"));
    }

    fn on_success(&mut self, value: u32) {
        self.log.lock().unwrap().push(format!("success:{}", value));
        std::panic::panic_any(HandlerFailure("success handler failed"));
    }
}

/// What an observer saw when an event arrived.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub event: String,
    pub context: ExecutionContext,
    pub thread: ThreadId,
}

/// Sends a [`Delivery`] per event over a channel.
pub struct ChannelObserver {
    pub tx: UnboundedSender<Delivery>,
    pub dispose_on_subscribe: bool,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<Delivery>) -> Self {
        Self {
            tx,
            dispose_on_subscribe: false,
        }
    }

    fn deliver(&self, event: String) {
        let _ = self.tx.send(Delivery {
            event,
            context: ExecutionContext::current(),
            thread: std::thread::current().id(),
        });
    }
}

impl SingleObserver<u32, OrderError> for ChannelObserver {
    fn on_subscribe(&mut self, disposable: Disposable) {
        self.deliver("subscribe".to_string());
        if self.dispose_on_subscribe {
            disposable.dispose();
        }
    }

    fn on_error(&mut self, error: OrderError) {
        self.deliver(format!("error:{}", error.0));
    }

    fn on_success(&mut self, value: u32) {
        self.deliver(format!("success:{}", value));
    }
}
