//! A request-lifecycle hook pipeline for service-oriented applications.
//!
//! Services are mounted by path on an [`App`](quill_app::App); every call runs
//! through `before`, `around`, `after` and `error` hooks contributed by three
//! layers (global, per-service and interceptor) before and after the service
//! method itself.

pub use quill_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use quill_internal::prelude::*;
}
