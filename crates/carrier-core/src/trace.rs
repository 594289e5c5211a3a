//! W3C trace context carried in the execution context.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Trace context for distributed tracing.
///
/// Compatible with the W3C Trace Context `traceparent` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// The trace ID (128-bit, hex encoded).
    pub trace_id: String,
    /// The span ID (64-bit, hex encoded).
    pub span_id: String,
    /// Parent span ID if this is a child span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    /// Whether this trace is sampled.
    pub sampled: bool,
}

impl TraceContext {
    /// Create a new root trace context.
    pub fn new() -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Create a child span from this context.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            sampled: self.sampled,
        }
    }

    /// Parse from a W3C traceparent header.
    ///
    /// Format: `{version}-{trace_id}-{span_id}-{flags}`
    /// Example: `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        let [version, trace_id, span_id, flags] = parts.as_slice() else {
            return None;
        };

        // Only version 00 is understood.
        if *version != "00" {
            return None;
        }
        if !is_hex_id(trace_id, 32) || !is_hex_id(span_id, 16) {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            parent_span_id: None,
            sampled: flags & 0x01 != 0,
        })
    }

    /// Format as a W3C traceparent header.
    pub fn to_traceparent(&self) -> String {
        let flags = if self.sampled { "01" } else { "00" };
        format!("00-{}-{}-{}", self.trace_id, self.span_id, flags)
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

// All-zero ids are invalid per W3C.
fn is_hex_id(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes().all(|b| b.is_ascii_hexdigit())
        && s.bytes().any(|b| b != b'0')
}

fn generate_trace_id() -> String {
    let mut rng = rand::thread_rng();
    let id: u128 = rng.gen_range(1..=u128::MAX);
    format!("{:032x}", id)
}

fn generate_span_id() -> String {
    let mut rng = rand::thread_rng();
    let id: u64 = rng.gen_range(1..=u64::MAX);
    format!("{:016x}", id)
}
