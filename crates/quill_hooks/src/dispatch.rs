//! The dispatch engine: six stages across three hook layers.
//!
//! | stage | runs | gated on no error |
//! |---|---|---|
//! | 1 | global `before` | yes |
//! | 2 | service `before` | yes |
//! | 3 | interceptor `before` | yes |
//! | 4 | around chain (global, service, interceptor) and the method | yes |
//! | 5 | `after`: interceptor, service, global | yes, per layer |
//! | 6 | `error`: interceptor, service, global | entered only on error, never cut short |
//!
//! The engine never fails: every problem ends up in the returned context.

use quill_service::{HookContext, HookPhase};
use tracing::Instrument;

use crate::around::run_around;
use crate::registry::{HookRegistry, PhaseHooks};
use crate::runner::run_standard;

/// The hooks that apply to one call, per layer.
#[derive(Debug, Clone, Default)]
pub struct CallHooks {
    /// Application-wide hooks.
    pub global: PhaseHooks,
    /// Interceptor-layer hooks.
    pub interceptors: PhaseHooks,
    /// Hooks of the target service.
    pub service: PhaseHooks,
}

impl CallHooks {
    /// Bundles already-filtered layers.
    #[must_use]
    pub fn new(global: PhaseHooks, interceptors: PhaseHooks, service: PhaseHooks) -> Self {
        Self {
            global,
            interceptors,
            service,
        }
    }

    /// Filters raw registries for `(path, method)`.
    ///
    /// `service` is `None` when the path did not resolve; that layer is then
    /// empty.
    #[must_use]
    pub fn resolve(
        global: &HookRegistry,
        interceptors: &HookRegistry,
        service: Option<&HookRegistry>,
        path: &str,
        method: &str,
    ) -> Self {
        Self {
            global: global.filter(path, method),
            interceptors: interceptors.filter(path, method),
            service: service
                .map(|registry| registry.filter_method(method))
                .unwrap_or_default(),
        }
    }

    /// Layers in `before` order.
    fn forward(&self) -> [(&'static str, &PhaseHooks); 3] {
        [
            ("global", &self.global),
            ("service", &self.service),
            ("interceptor", &self.interceptors),
        ]
    }

    /// Layers in `after` and `error` order.
    fn unwind(&self) -> [(&'static str, &PhaseHooks); 3] {
        [
            ("interceptor", &self.interceptors),
            ("service", &self.service),
            ("global", &self.global),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Runs calls through the hook pipeline.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    suppress_error_hook_errors: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher that suppresses failures inside error hooks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            suppress_error_hook_errors: true,
        }
    }

    /// Sets whether a failing error hook is only logged (`true`) or replaces
    /// the recorded error (`false`).
    #[must_use]
    pub fn with_suppress_error_hook_errors(mut self, suppress: bool) -> Self {
        self.suppress_error_hook_errors = suppress;
        self
    }

    /// Returns whether error-hook failures are suppressed.
    #[must_use]
    pub fn suppresses_error_hook_errors(&self) -> bool {
        self.suppress_error_hook_errors
    }

    /// Filters the raw registries for the context's path and method, then
    /// runs the pipeline.
    pub async fn run_registries(
        &self,
        global: &HookRegistry,
        interceptors: &HookRegistry,
        service: Option<&HookRegistry>,
        ctx: HookContext,
    ) -> HookContext {
        let hooks = CallHooks::resolve(global, interceptors, service, &ctx.path, &ctx.method);
        self.run(&hooks, ctx).await
    }

    /// Runs the six stages and returns the final context.
    ///
    /// A context that arrives with `error` already set goes straight to the
    /// error hooks.
    pub async fn run(&self, hooks: &CallHooks, ctx: HookContext) -> HookContext {
        let span = tracing::debug_span!("dispatch", path = %ctx.path, method = %ctx.method);
        self.run_stages(hooks, ctx).instrument(span).await
    }

    async fn run_stages(&self, hooks: &CallHooks, mut ctx: HookContext) -> HookContext {
        let suppress = self.suppress_error_hook_errors;

        // Stages 1-3
        for (layer, phase_hooks) in hooks.forward() {
            if ctx.has_error() {
                break;
            }
            tracing::trace!(layer, "before");
            run_standard(phase_hooks.before(), &mut ctx, HookPhase::Before, suppress).await;
        }

        // Stage 4
        if !ctx.has_error() {
            let chain = hooks
                .forward()
                .iter()
                .flat_map(|(_, phase_hooks)| phase_hooks.around().iter().cloned())
                .collect();
            ctx = run_around(chain, ctx).await;
        }

        // Stage 5
        if !ctx.has_error() {
            for (layer, phase_hooks) in hooks.unwind() {
                if ctx.has_error() {
                    break;
                }
                tracing::trace!(layer, "after");
                run_standard(phase_hooks.after(), &mut ctx, HookPhase::After, suppress).await;
            }
        }

        // Stage 6
        if ctx.has_error() {
            tracing::debug!(error = ?ctx.error, "call failed, running error hooks");
            for (layer, phase_hooks) in hooks.unwind() {
                tracing::trace!(layer, "error");
                run_standard(phase_hooks.error(), &mut ctx, HookPhase::Error, suppress).await;
            }
        }

        ctx
    }
}
