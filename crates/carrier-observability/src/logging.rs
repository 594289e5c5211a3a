//! Structured logging correlated with the current execution context.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use carrier_core::ExecutionContext;
use serde::Serialize;

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// A structured log entry stamped with correlation fields.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Emitting component.
    pub component: String,
    /// Trace ID of the execution context the entry was written under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span ID of that context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Principal name of that context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Build an entry correlated with `context`.
    pub fn new(
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
        context: &ExecutionContext,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            component: component.into(),
            trace_id: context.trace.as_ref().map(|t| t.trace_id.clone()),
            span_id: context.trace.as_ref().map(|t| t.span_id.clone()),
            principal: context.principal.as_ref().map(|p| p.name.clone()),
            fields: HashMap::new(),
        }
    }

    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {}: {}", self.level, self.component, self.message);

        if let Some(trace_id) = &self.trace_id {
            s.push_str(&format!(" trace={}", trace_id));
        }
        if let Some(principal) = &self.principal {
            s.push_str(&format!(" principal={}", principal));
        }

        if !self.fields.is_empty() {
            let mut fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            s.push_str(" | ");
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Where log entries go.
#[derive(Debug, Clone, Default)]
pub enum LogSink {
    /// Formatted lines on stderr.
    #[default]
    Stderr,
    /// Entries collected in memory.
    Memory(Arc<Mutex<Vec<LogEntry>>>),
}

impl LogSink {
    /// A fresh in-memory sink and a handle to its entries.
    pub fn memory() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self::Memory(Arc::clone(&entries)), entries)
    }
}

/// Structured logger that reads the execution context at each call.
///
/// Because the context is read when an entry is written, entries written
/// inside an instrumented callback carry the subscriber's trace and
/// principal even on another thread.
#[derive(Debug, Clone)]
pub struct ContextLogger {
    component: String,
    min_level: LogLevel,
    format: LogFormat,
    sink: LogSink,
}

impl ContextLogger {
    /// Create a logger for `component`.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            min_level: LogLevel::Info,
            format: LogFormat::Json,
            sink: LogSink::Stderr,
        }
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the sink.
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, HashMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, HashMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, HashMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, HashMap::new());
    }

    /// Log with additional fields.
    pub fn log_with_fields(
        &self,
        level: LogLevel,
        message: &str,
        fields: HashMap<String, serde_json::Value>,
    ) {
        self.log(level, message, fields);
    }

    fn log(&self, level: LogLevel, message: &str, fields: HashMap<String, serde_json::Value>) {
        if level < self.min_level {
            return;
        }

        let mut entry = LogEntry::new(
            level,
            self.component.as_str(),
            message,
            &ExecutionContext::current(),
        );
        entry.fields = fields;

        match &self.sink {
            LogSink::Stderr => {
                let output = match self.format {
                    LogFormat::Json => entry.to_json(),
                    LogFormat::Human => entry.to_human(),
                };
                eprintln!("{}", output);
            }
            LogSink::Memory(entries) => {
                if let Ok(mut entries) = entries.lock() {
                    entries.push(entry);
                }
            }
        }
    }
}
