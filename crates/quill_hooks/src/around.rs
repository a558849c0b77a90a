//! The around chain and the terminal method invocation.
//!
//! Around hooks form a continuation chain. Hook `i` receives a [`Next`] that
//! drives hooks `i + 1..` and finally the service method itself. A hook that
//! never calls its continuation short-circuits everything after it.

use std::sync::Arc;

use quill_service::{BoxFuture, HookContext, HookPhase, MethodCall, ServiceError};

use crate::hook::{HookFn, HookRegistration, catch_panic};

/// Continuation handed to an around hook.
///
/// Cheap to clone. Each call runs the remainder of the chain on the context it
/// is given and returns the resulting context; calling it more than once runs
/// the remainder more than once.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[HookRegistration]>,
    index: usize,
}

impl Next {
    /// Runs the rest of the chain on `ctx` and returns the resulting context.
    pub fn call(&self, ctx: HookContext) -> BoxFuture<'static, HookContext> {
        dispatch(Arc::clone(&self.chain), self.index, ctx)
    }

    /// Runs the rest of the chain on a copy of `ctx`, then replaces `ctx`
    /// with the result.
    pub async fn run(&self, ctx: &mut HookContext) {
        let out = self.call(ctx.clone()).await;
        *ctx = out;
    }

    /// Number of around hooks still ahead of the terminal call.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl core::fmt::Debug for Next {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

/// Runs `hooks` as one continuation chain ending in the service method.
///
/// With no hooks this is just the terminal call.
pub async fn run_around(hooks: Vec<HookRegistration>, ctx: HookContext) -> HookContext {
    dispatch(Arc::from(hooks), 0, ctx).await
}

fn dispatch(
    chain: Arc<[HookRegistration]>,
    index: usize,
    ctx: HookContext,
) -> BoxFuture<'static, HookContext> {
    Box::pin(async move {
        let Some(registration) = chain.get(index) else {
            return invoke_method(ctx).await;
        };

        let next = Next {
            chain: Arc::clone(&chain),
            index: index + 1,
        };
        let mut working = ctx;
        working.phase = HookPhase::Around;

        match registration.hook() {
            HookFn::Around(hook) => {
                if let Err(err) = catch_panic(hook(&mut working, next)).await {
                    tracing::debug!(
                        hook = %registration.label(),
                        error = %err,
                        "around hook failed, unwinding"
                    );
                    working.error = Some(err);
                    working.phase = HookPhase::Error;
                }
                working
            }
            HookFn::Standard(_) => {
                tracing::warn!(
                    hook = %registration.label(),
                    "standard hook registered in the around phase, passing through"
                );
                next.call(working).await
            }
        }
    })
}

/// Invokes the service method named by `ctx.method`.
///
/// A context that already carries an error is returned untouched. A missing
/// service or an unlisted method records [`ServiceError::MethodNotFound`].
/// Otherwise the method's value lands in `result` and its failure (or panic)
/// in `error`.
pub async fn invoke_method(mut ctx: HookContext) -> HookContext {
    if ctx.has_error() {
        return ctx;
    }

    let Some(service) = ctx.service.clone() else {
        ctx.error = Some(ServiceError::method_not_found(ctx.method.clone()));
        return ctx;
    };
    if !service.has_method(&ctx.method) {
        tracing::debug!(path = %ctx.path, method = %ctx.method, "method not invocable");
        ctx.error = Some(ServiceError::method_not_found(ctx.method.clone()));
        return ctx;
    }

    tracing::trace!(path = %ctx.path, method = %ctx.method, "invoking service method");
    let call = MethodCall::from_context(&ctx);
    match catch_panic(call.invoke(service.as_ref())).await {
        Ok(value) => ctx.result = Some(value),
        Err(err) => ctx.error = Some(err),
    }
    ctx
}
