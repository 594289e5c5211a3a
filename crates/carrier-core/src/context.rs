//! Ambient execution context stored per thread.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::trace::TraceContext;

/// The authenticated principal a unit of work runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal name (e.g. user id or service account).
    pub name: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    /// Create a principal without roles.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Add a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Whether the principal holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Execution-scoped state that follows work across thread hops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Active trace, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,
    /// Authenticated principal, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Free-form baggage.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

thread_local! {
    static CURRENT: RefCell<ExecutionContext> = RefCell::new(ExecutionContext::default());
}

impl ExecutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trace context.
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Set the principal.
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Add a baggage attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get a baggage attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Whether there is nothing to propagate.
    pub fn is_empty(&self) -> bool {
        self.trace.is_none() && self.principal.is_none() && self.attributes.is_empty()
    }

    /// Clone the calling thread's context.
    ///
    /// Returns an empty context if the thread-local is unavailable.
    pub fn current() -> Self {
        Self::try_current().unwrap_or_default()
    }

    /// Clone the calling thread's context, reporting why it is unavailable.
    pub fn try_current() -> Result<Self, CaptureError> {
        CURRENT
            .try_with(|cell| {
                cell.try_borrow()
                    .map(|ctx| ctx.clone())
                    .map_err(|_| CaptureError::ContextBusy)
            })
            .map_err(|_| CaptureError::ContextUnavailable)?
    }

    /// Install `context` on the calling thread and return the one it replaced.
    pub fn replace_current(context: Self) -> Result<Self, CaptureError> {
        CURRENT
            .try_with(|cell| {
                cell.try_borrow_mut()
                    .map(|mut ctx| std::mem::replace(&mut *ctx, context))
                    .map_err(|_| CaptureError::ContextBusy)
            })
            .map_err(|_| CaptureError::ContextUnavailable)?
    }

    /// Install this context until the returned scope is dropped.
    pub fn enter(self) -> ContextScope {
        let previous = Self::replace_current(self).ok();
        ContextScope { previous }
    }

    /// Run `f` with this context installed.
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        let _scope = self.enter();
        f()
    }
}

/// Restores the previous execution context when dropped.
#[must_use = "the context is restored when the scope is dropped"]
#[derive(Debug)]
pub struct ContextScope {
    previous: Option<ExecutionContext>,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        if let Err(error) = ExecutionContext::replace_current(previous) {
            tracing::debug!(%error, "could not restore previous execution context");
        }
    }
}
