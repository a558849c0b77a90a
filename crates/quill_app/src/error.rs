//! Errors raised while configuring or starting an application.
//!
//! Call-time failures never surface here; they live on the returned
//! [`HookContext`](quill_service::HookContext).

use quill_hooks::PatternError;
use quill_service::ServiceError;

/// Application setup failure.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A service is already mounted at this path.
    #[error("a service is already mounted at '{0}'")]
    DuplicatePath(String),

    /// No service is mounted at this path.
    #[error("no service is mounted at '{0}'")]
    UnknownService(String),

    /// A unique plugin was added twice.
    #[error(
        "plugin '{0}' is unique and was already added; \
         return false from `is_unique()` to allow multiple instances"
    )]
    DuplicatePlugin(String),

    /// A plugin was added before one of its dependencies.
    #[error("plugin '{plugin}' requires '{dependency}' which was not added; add it first")]
    MissingDependency {
        /// The plugin being added.
        plugin: String,
        /// The dependency that is missing.
        dependency: &'static str,
    },

    /// A hook pattern did not compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Settings could not be loaded.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A service's `setup` failed.
    #[error("setup of service '{path}' failed: {source}")]
    ServiceSetup {
        /// Mount path of the service.
        path: String,
        /// The service's error.
        #[source]
        source: ServiceError,
    },

    /// A service's `teardown` failed.
    #[error("teardown of service '{path}' failed: {source}")]
    ServiceTeardown {
        /// Mount path of the service.
        path: String,
        /// The service's error.
        #[source]
        source: ServiceError,
    },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}
