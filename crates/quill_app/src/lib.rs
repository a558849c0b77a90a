//! Hosting application for Quill (Layer 2).
//!
//! `quill_app` ties services and hooks together: it mounts services by path,
//! keeps the global, interceptor and per-service hook layers, exposes
//! settings and plugins, and runs programmatic calls through the
//! [`Dispatcher`](quill_hooks::Dispatcher).
//!
//! # Core Concepts
//!
//! - [`App`] - Cloneable application handle
//! - [`ServiceHandle`] - Calls one service through the pipeline
//! - [`CallArgs`] - Identifier, payload and params of one call
//! - [`Plugin`] - Unit of configuration with a build/ready/cleanup lifecycle
//! - [`AppError`] - Setup-time failures

/// Application state and call entry point.
pub mod app;

/// Setup-time errors.
pub mod error;

/// Per-service call handles.
pub mod handle;

/// Plugin trait and identifiers.
pub mod plugin;

pub use app::{App, CallArgs, normalize_path};
pub use error::AppError;
pub use handle::ServiceHandle;
pub use plugin::{Plugin, PluginId};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::app::{App, CallArgs};
    pub use crate::error::AppError;
    pub use crate::handle::ServiceHandle;
    pub use crate::plugin::{Plugin, PluginId};
}
