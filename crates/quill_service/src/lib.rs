//! Service and call-context primitives for Quill (Layer 1).
//!
//! `quill_service` defines the data that flows through a call and the
//! interface a service exposes to the engine. It has no knowledge of hooks;
//! `quill_hooks` builds the pipeline on top of these types.
//!
//! # Core Concepts
//!
//! - [`HookContext`] - The mutable per-call record (path, method, phase,
//!   params, id, data, result, error, status code)
//! - [`ContextUpdate`] - Partial update a hook returns, shallow-merged
//! - [`Service`] - Async methods addressed by name
//! - [`MethodCall`] - Positional arguments rebuilt from a context
//! - [`ServiceError`] - Failure kinds and their default status codes
//! - [`Application`] - What a hook can reach through `ctx.app`
//!
//! # Architecture
//!
//! - **Layer 1** (`quill_service`): Context and service primitives (this crate)
//! - **Layer 2** (`quill_hooks`): Hook registries, runners and dispatch
//! - **Layer 2** (`quill_app`): Hosting application
//! - **Layer 3** (`quill_core_plugins`): Infrastructure plugins

/// Application capabilities visible to hooks.
pub mod application;

/// Per-call context and partial updates.
pub mod context;

/// Error taxonomy.
pub mod error;

/// Service trait and argument reconstruction.
pub mod service;

/// Identifier and parameter value types.
pub mod value;

pub use application::{Application, NoApp};
pub use context::{ContextUpdate, HookContext, HookPhase};
pub use error::ServiceError;
pub use service::{BoxFuture, MethodCall, STANDARD_METHODS, Service, ServiceResult};
pub use value::{Id, Params};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::application::{Application, NoApp};
    pub use crate::context::{ContextUpdate, HookContext, HookPhase};
    pub use crate::error::ServiceError;
    pub use crate::service::{BoxFuture, MethodCall, Service, ServiceResult};
    pub use crate::value::{Id, Params};
}
