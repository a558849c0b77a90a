//! # Quill Internal Library
//!
//! Re-exports the core Quill crates for convenience.

/// Layer 1: Context model, service trait and errors.
pub use quill_service;

/// Layer 2: Hook registries and the dispatch engine.
pub use quill_hooks;

/// Layer 2: Hosting application.
pub use quill_app;

/// Layer 3: Infrastructure plugins.
pub use quill_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use quill_app::prelude::*;
    pub use quill_hooks::prelude::*;
}
