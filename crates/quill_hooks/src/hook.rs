//! Hook functions and their registrations.
//!
//! Hooks come in two shapes, fixed at registration time:
//!
//! - **Standard** hooks (`before`, `after`, `error`) receive the context and
//!   may return a [`ContextUpdate`] to shallow-merge onto it.
//! - **Around** hooks receive the context plus a [`Next`] continuation and
//!   decide whether and when the rest of the chain runs.
//!
//! # Example
//!
//! ```ignore
//! let stamp = HookRegistration::before(|ctx| {
//!     Box::pin(async move {
//!         ctx.params.insert("start", 42);
//!         Ok(None)
//!     })
//! })
//! .for_path("messages")
//! .for_method("get");
//!
//! let wrap = HookRegistration::around(|ctx, next| {
//!     Box::pin(async move {
//!         next.run(ctx).await;
//!         Ok(())
//!     })
//! });
//! ```

use core::any::Any;
use core::fmt;
use core::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use quill_service::{BoxFuture, ContextUpdate, HookContext, HookPhase, ServiceError};

use crate::around::Next;
use crate::pattern::Pattern;

/// Outcome of a standard hook: an optional update, or a failure to record.
pub type HookResult = Result<Option<ContextUpdate>, ServiceError>;

/// Type-erased standard hook.
pub type StandardHookFn =
    dyn for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync;

/// Type-erased around hook.
pub type AroundHookFn = dyn for<'a> Fn(&'a mut HookContext, Next) -> BoxFuture<'a, Result<(), ServiceError>>
    + Send
    + Sync;

/// Awaits `future`, turning a panic into [`ServiceError::General`].
///
/// Partial changes the future made to borrowed state before panicking stay.
pub(crate) async fn catch_panic<T, F>(future: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ServiceError::general(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

// ─────────────────────────────────────────────────────────────────────────────
// HookFn
// ─────────────────────────────────────────────────────────────────────────────

/// A hook function, tagged with its shape.
#[derive(Clone)]
pub enum HookFn {
    /// `(context) -> update`
    Standard(Arc<StandardHookFn>),
    /// `(context, next) -> ()`
    Around(Arc<AroundHookFn>),
}

impl HookFn {
    /// Wraps a standard hook.
    pub fn standard<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        HookFn::Standard(Arc::new(f))
    }

    /// Wraps an around hook.
    pub fn around<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext, Next) -> BoxFuture<'a, Result<(), ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        HookFn::Around(Arc::new(f))
    }

    /// Returns `true` for the around shape.
    #[must_use]
    pub fn is_around(&self) -> bool {
        matches!(self, HookFn::Around(_))
    }

    /// Shape name, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            HookFn::Standard(_) => "standard",
            HookFn::Around(_) => "around",
        }
    }
}

impl fmt::Debug for HookFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookFn::{}", self.kind())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistration
// ─────────────────────────────────────────────────────────────────────────────

/// A hook bound to a phase and to the paths and methods it applies to.
///
/// Registrations are immutable once handed to a registry. Both patterns
/// default to [`Pattern::Any`].
#[derive(Debug, Clone)]
pub struct HookRegistration {
    phase: HookPhase,
    hook: HookFn,
    path: Pattern,
    method: Pattern,
    name: Option<String>,
}

impl HookRegistration {
    /// Creates a registration from an explicit phase and function.
    ///
    /// Pairing an around function with a standard phase (or the reverse) is
    /// accepted here; the runners skip the mismatch with a warning.
    #[must_use]
    pub fn new(phase: HookPhase, hook: HookFn) -> Self {
        Self {
            phase,
            hook,
            path: Pattern::Any,
            method: Pattern::Any,
            name: None,
        }
    }

    /// Registers a `before` hook.
    pub fn before<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        Self::new(HookPhase::Before, HookFn::standard(f))
    }

    /// Registers an `after` hook.
    pub fn after<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        Self::new(HookPhase::After, HookFn::standard(f))
    }

    /// Registers an `error` hook.
    pub fn error<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        Self::new(HookPhase::Error, HookFn::standard(f))
    }

    /// Registers an `around` hook.
    pub fn around<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut HookContext, Next) -> BoxFuture<'a, Result<(), ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(HookPhase::Around, HookFn::around(f))
    }

    /// Restricts the registration to matching service paths.
    ///
    /// Ignored for per-service registries, where the service is implicit.
    #[must_use]
    pub fn for_path(mut self, pattern: impl Into<Pattern>) -> Self {
        self.path = pattern.into();
        self
    }

    /// Restricts the registration to matching methods. `"all"` matches every
    /// method.
    #[must_use]
    pub fn for_method(mut self, pattern: impl Into<Pattern>) -> Self {
        self.method = match pattern.into() {
            Pattern::Glob(glob) => Pattern::method(glob.as_str()),
            pattern => pattern,
        };
        self
    }

    /// Names the hook for diagnostics.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The phase this hook runs in.
    #[must_use]
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    /// The hook function.
    #[must_use]
    pub fn hook(&self) -> &HookFn {
        &self.hook
    }

    /// Path pattern.
    #[must_use]
    pub fn path_pattern(&self) -> &Pattern {
        &self.path
    }

    /// Method pattern.
    #[must_use]
    pub fn method_pattern(&self) -> &Pattern {
        &self.method
    }

    /// Diagnostic name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Label used in log output: the name, or the patterns.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}:{}", self.path, self.method),
        }
    }

    /// Returns `true` if both patterns match.
    #[must_use]
    pub fn applies_to(&self, path: &str, method: &str) -> bool {
        self.path.matches(path) && self.method.matches(method)
    }

    /// Returns `true` if the method pattern matches.
    #[must_use]
    pub fn applies_to_method(&self, method: &str) -> bool {
        self.method.matches(method)
    }
}
