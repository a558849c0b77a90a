//! The per-call context threaded through every hook.

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::application::{Application, NoApp};
use crate::error::ServiceError;
use crate::service::Service;
use crate::value::{Id, Params};

// ─────────────────────────────────────────────────────────────────────────────
// HookPhase
// ─────────────────────────────────────────────────────────────────────────────

/// The pipeline stage currently executing.
///
/// This reflects where the call is, not whether it has failed; the presence
/// of [`HookContext::error`] is the failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Runs before the method, in registration order.
    Before,
    /// Runs after a successful method call, in reverse registration order.
    After,
    /// Runs once a failure has been recorded, in reverse registration order.
    Error,
    /// Wraps the method call through a continuation.
    Around,
}

impl HookPhase {
    /// All phases, in pipeline order.
    pub const ALL: [HookPhase; 4] = [
        HookPhase::Before,
        HookPhase::Around,
        HookPhase::After,
        HookPhase::Error,
    ];

    /// Lowercase name of the phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookPhase::Before => "before",
            HookPhase::After => "after",
            HookPhase::Error => "error",
            HookPhase::Around => "around",
        }
    }

    /// Returns `true` for phases whose hooks run last-registered first.
    #[must_use]
    pub fn is_lifo(self) -> bool {
        matches!(self, HookPhase::After | HookPhase::Error)
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookContext
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable record carried through one call.
///
/// Cloning is shallow for `app` and `service` and deep for everything else,
/// which is what the around chain relies on when it hands each hook its own
/// working copy.
#[derive(Clone)]
pub struct HookContext {
    /// The hosting application.
    pub app: Arc<dyn Application>,
    /// Target service, absent when the path did not resolve.
    pub service: Option<Arc<dyn Service>>,
    /// Service path.
    pub path: String,
    /// Method being invoked.
    pub method: String,
    /// Stage currently executing.
    pub phase: HookPhase,
    /// Route, query and transport parameters.
    pub params: Params,
    /// Record identifier.
    pub id: Option<Id>,
    /// Request payload.
    pub data: Option<Value>,
    /// Response payload.
    pub result: Option<Value>,
    /// Failure, if any. Its presence alone marks the call as failed.
    pub error: Option<ServiceError>,
    /// Outcome code overriding the default mapping of `error`.
    pub status_code: Option<u16>,
}

impl HookContext {
    /// Creates a context in the `before` phase.
    pub fn new(
        app: Arc<dyn Application>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            app,
            service: None,
            path: path.into(),
            method: method.into(),
            phase: HookPhase::Before,
            params: Params::new(),
            id: None,
            data: None,
            result: None,
            error: None,
            status_code: None,
        }
    }

    /// Creates a context that is not attached to any application.
    pub fn detached(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(Arc::new(NoApp), path, method)
    }

    /// Sets the target service.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn Service>) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Pre-fails the context: records `error` and moves to the `error` phase.
    ///
    /// This is how callers build the context for a path that did not resolve
    /// to a service.
    #[must_use]
    pub fn failed(mut self, error: ServiceError) -> Self {
        self.error = Some(error);
        self.phase = HookPhase::Error;
        self
    }

    /// Returns `true` once a failure has been recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Shallow-merges `update` onto this context.
    ///
    /// Fields set on the update overwrite; unset fields leave the context
    /// untouched. `params` is replaced as a whole.
    pub fn apply(&mut self, update: ContextUpdate) {
        let ContextUpdate {
            params,
            id,
            data,
            result,
            error,
            status_code,
        } = update;

        if let Some(params) = params {
            self.params = params;
        }
        if let Some(id) = id {
            self.id = Some(id);
        }
        if let Some(data) = data {
            self.data = Some(data);
        }
        if let Some(result) = result {
            self.result = Some(result);
        }
        if let Some(error) = error {
            self.error = Some(error);
        }
        if let Some(status_code) = status_code {
            self.status_code = Some(status_code);
        }
    }

    /// Effective outcome code: the explicit override, else the error's
    /// default, else `None` for a successful call.
    #[must_use]
    pub fn effective_status(&self) -> Option<u16> {
        self.status_code
            .or_else(|| self.error.as_ref().map(ServiceError::status_code))
    }

    /// Consumes the context, yielding the result or the recorded error.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`ServiceError`] when the call failed.
    pub fn into_result(self) -> Result<Value, ServiceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("service", &self.service.is_some())
            .field("path", &self.path)
            .field("method", &self.method)
            .field("phase", &self.phase)
            .field("params", &self.params)
            .field("id", &self.id)
            .field("data", &self.data)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("status_code", &self.status_code)
            .finish_non_exhaustive()
    }
}

/// Compares the call state. `app` and `service` compare by identity.
impl PartialEq for HookContext {
    fn eq(&self, other: &Self) -> bool {
        let same_service = match (&self.service, &other.service) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        Arc::ptr_eq(&self.app, &other.app)
            && same_service
            && self.path == other.path
            && self.method == other.method
            && self.phase == other.phase
            && self.params == other.params
            && self.id == other.id
            && self.data == other.data
            && self.result == other.result
            && self.error == other.error
            && self.status_code == other.status_code
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextUpdate
// ─────────────────────────────────────────────────────────────────────────────

/// Partial context returned by a standard hook.
///
/// See [`HookContext::apply`] for the merge rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextUpdate {
    /// Replacement parameters.
    pub params: Option<Params>,
    /// Replacement identifier.
    pub id: Option<Id>,
    /// Replacement payload.
    pub data: Option<Value>,
    /// Replacement result.
    pub result: Option<Value>,
    /// Failure to record.
    pub error: Option<ServiceError>,
    /// Outcome code override.
    pub status_code: Option<u16>,
}

impl ContextUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Replaces the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Replaces the result.
    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Records a failure.
    #[must_use]
    pub fn with_error(mut self, error: ServiceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Overrides the outcome code.
    #[must_use]
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }
}
