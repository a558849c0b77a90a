//! Hooks wired around the message service.

use quill_hooks::{HookRegistration, Pattern, PatternError};
use quill_service::{ContextUpdate, ServiceError};
use serde_json::{Value, json};

/// Global `before`: logs every incoming call.
#[must_use]
pub fn log_request() -> HookRegistration {
    HookRegistration::before(|ctx| {
        Box::pin(async move {
            tracing::info!(path = %ctx.path, method = %ctx.method, id = ?ctx.id, "call");
            Ok(None)
        })
    })
    .named("log_request")
}

/// Global `error`: logs failures with their status code.
#[must_use]
pub fn log_error() -> HookRegistration {
    HookRegistration::error(|ctx| {
        Box::pin(async move {
            if let Some(error) = &ctx.error {
                tracing::warn!(
                    path = %ctx.path,
                    method = %ctx.method,
                    status = ctx.effective_status(),
                    %error,
                    "call failed"
                );
            }
            Ok(None)
        })
    })
    .named("log_error")
}

/// Interceptor `before` for writes: requires `params.user`.
///
/// Reads stay anonymous.
///
/// # Errors
///
/// Returns [`PatternError`] if the method pattern fails to compile.
pub fn require_user() -> Result<HookRegistration, PatternError> {
    let writes = Pattern::regex("^(create|patch|remove)$")?;
    Ok(HookRegistration::before(|ctx| {
        Box::pin(async move {
            if ctx.params.get("user").and_then(Value::as_str).is_none() {
                return Err(ServiceError::not_authenticated(
                    "params.user is required for writes",
                ));
            }
            Ok(None)
        })
    })
    .for_method(writes)
    .named("require_user"))
}

/// Service `before` on `create`: trims the text, rejects empty messages and
/// stamps the author from `params.user`.
#[must_use]
pub fn validate_message() -> HookRegistration {
    HookRegistration::before(|ctx| {
        Box::pin(async move {
            let text = ctx
                .data
                .as_ref()
                .and_then(|data| data.get("text"))
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if text.is_empty() {
                return Err(ServiceError::bad_request("message text must not be empty"));
            }

            let data = json!({ "text": text, "user": ctx.params.get("user") });
            Ok(Some(ContextUpdate::new().with_data(data)))
        })
    })
    .for_method("create")
    .named("validate_message")
}

/// Service `after` on `find`: wraps the list with its total.
#[must_use]
pub fn paginate() -> HookRegistration {
    HookRegistration::after(|ctx| {
        Box::pin(async move {
            let data = ctx.result.take().unwrap_or_else(|| json!([]));
            let total = data.as_array().map_or(0, Vec::len);
            Ok(Some(
                ContextUpdate::new().with_result(json!({ "total": total, "data": data })),
            ))
        })
    })
    .for_method("find")
    .named("paginate")
}
