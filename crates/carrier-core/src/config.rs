//! Instrumentation configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which instrumentation is applied to reactive callbacks.
///
/// ```toml
/// enabled = true
/// propagate_context = true
/// propagate_spans = false
/// record_metrics = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Master switch. When off, every callback is forwarded directly.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Propagate the per-thread execution context.
    #[serde(default = "default_true")]
    pub propagate_context: bool,

    /// Re-enter the subscriber's `tracing` span around callbacks.
    #[serde(default = "default_true")]
    pub propagate_spans: bool,

    /// Count captures, capture failures and brackets.
    #[serde(default = "default_true")]
    pub record_metrics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            propagate_context: true,
            propagate_spans: true,
            record_metrics: true,
        }
    }
}

impl InstrumentationConfig {
    /// A configuration with instrumentation switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            Self::from_json(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether execution context propagation is active.
    pub fn context_enabled(&self) -> bool {
        self.enabled && self.propagate_context
    }

    /// Whether span propagation is active.
    pub fn spans_enabled(&self) -> bool {
        self.enabled && self.propagate_spans
    }

    /// Whether metrics are recorded.
    pub fn metrics_enabled(&self) -> bool {
        self.enabled && self.record_metrics
    }
}
