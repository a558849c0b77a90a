//! Example message service built with Quill.
//!
//! Mounts an in-memory `messages` service and wraps it in all three hook
//! layers:
//!
//! ```text
//! call ──▶ global before ──▶ service before ──▶ interceptor before
//!                                                      │
//!          ┌───────────── around chain ◀───────────────┘
//!          ▼
//!     TimingPlugin ──▶ MessageService method
//!          │
//!          ▼
//! interceptor after ──▶ service after ──▶ global after ──▶ result
//! ```
//!
//! Any failure jumps to the error hooks, which unwind in the same order as
//! `after` hooks.

pub mod hooks;
mod store;

pub use store::{Message, MessageService};

use quill_app::{App, AppError};
use quill_core_plugins::{TimingPlugin, TracingPlugin};

/// Mount path of the message service.
pub const MESSAGES: &str = "messages";

/// Builds the demo application.
///
/// # Errors
///
/// Returns [`AppError`] if a plugin, mount or hook registration fails.
pub fn build_app(logging: TracingPlugin, timing: TimingPlugin) -> Result<App, AppError> {
    let app = App::new();
    app.add_plugin(logging)?.add_plugin(timing)?;

    app.mount(MESSAGES, MessageService::new())?;

    app.hooks([hooks::log_request(), hooks::log_error()]);
    app.interceptors([hooks::require_user()?]);
    app.service_hooks(MESSAGES, [hooks::validate_message(), hooks::paginate()])?;

    Ok(app)
}
