//! Sequential runner for the standard phases (`before`, `after`, `error`).

use quill_service::{HookContext, HookPhase};

use crate::hook::{HookFn, HookRegistration, catch_panic};

/// Runs one layer's standard hooks for `phase`.
///
/// - Sets `ctx.phase` first.
/// - `before` runs in registration order, `after` and `error` in reverse.
/// - In `before` and `after`, the loop stops as soon as `ctx.error` is set.
///   In `error`, every hook runs.
/// - A panicking hook counts as a failing one.
/// - A failing hook records its error, except in the `error` phase with
///   `suppress_error_hook_errors` set, where the failure is only logged.
/// - Around-shaped functions found here are skipped with a warning.
pub async fn run_standard(
    hooks: &[HookRegistration],
    ctx: &mut HookContext,
    phase: HookPhase,
    suppress_error_hook_errors: bool,
) {
    ctx.phase = phase;

    let ordered: Vec<&HookRegistration> = if phase.is_lifo() {
        hooks.iter().rev().collect()
    } else {
        hooks.iter().collect()
    };

    for registration in ordered {
        if phase != HookPhase::Error && ctx.has_error() {
            tracing::trace!(%phase, "error recorded, skipping remaining hooks");
            break;
        }

        let HookFn::Standard(hook) = registration.hook() else {
            tracing::warn!(
                hook = %registration.label(),
                %phase,
                "around hook registered in a standard phase, skipping"
            );
            continue;
        };

        match catch_panic(hook(&mut *ctx)).await {
            Ok(Some(update)) => ctx.apply(update),
            Ok(None) => {}
            Err(err) if phase == HookPhase::Error && suppress_error_hook_errors => {
                tracing::warn!(
                    hook = %registration.label(),
                    error = %err,
                    "error hook failed, suppressed"
                );
            }
            Err(err) => {
                tracing::debug!(hook = %registration.label(), %phase, error = %err, "hook failed");
                ctx.error = Some(err);
            }
        }
    }
}
