//! Hook pipeline for Quill (Layer 2).
//!
//! `quill_hooks` decides which interceptors run around a service call, in
//! what order, and how failures move the call into its error path.
//!
//! # Core Concepts
//!
//! - [`Pattern`] - Which paths and methods a hook applies to
//! - [`HookRegistration`] - A hook bound to a phase and patterns
//! - [`HookRegistry`] - One layer's ordered registrations
//! - [`Next`] - Continuation handed to around hooks
//! - [`Dispatcher`] - Runs the six-stage pipeline and returns the final context
//!
//! # Layers and order
//!
//! Three layers contribute hooks: global, service, and interceptor.
//! `before` hooks run global, service, interceptor, each in registration
//! order. Around hooks chain in the same layer order. `after` and `error`
//! hooks unwind: interceptor, service, global, each last-registered first.
//!
//! # Example
//!
//! ```ignore
//! use quill_hooks::prelude::*;
//!
//! let mut global = HookRegistry::new();
//! global.register(HookRegistration::before(|ctx| {
//!     Box::pin(async move {
//!         ctx.params.insert("user", "ann");
//!         Ok(None)
//!     })
//! }));
//!
//! let ctx = HookContext::detached("messages", "find").with_service(service);
//! let out = Dispatcher::new()
//!     .run_registries(&global, &HookRegistry::new(), None, ctx)
//!     .await;
//! ```

/// Around chain and terminal method invocation.
pub mod around;

/// Six-stage dispatch engine.
pub mod dispatch;

/// Hook functions and registrations.
pub mod hook;

/// Path and method patterns.
pub mod pattern;

/// Registries and per-call filtering.
pub mod registry;

/// Standard-phase runner.
pub mod runner;

pub use around::{Next, invoke_method, run_around};
pub use dispatch::{CallHooks, Dispatcher};
pub use hook::{AroundHookFn, HookFn, HookRegistration, HookResult, StandardHookFn};
pub use pattern::{Glob, Pattern, PatternError};
pub use registry::{HookRegistry, PhaseHooks};
pub use runner::run_standard;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::around::Next;
    pub use crate::dispatch::{CallHooks, Dispatcher};
    pub use crate::hook::{HookFn, HookRegistration, HookResult};
    pub use crate::pattern::{Pattern, PatternError};
    pub use crate::registry::{HookRegistry, PhaseHooks};
    pub use quill_service::prelude::*;
}
