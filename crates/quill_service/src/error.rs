//! Error taxonomy carried through the call context.
//!
//! The engine only reacts to whether an error is present; the kind matters to
//! whoever translates the final context into a transport response.

/// A failure recorded on a [`HookContext`](crate::HookContext).
///
/// Values are cloneable because the context is cloned for every around-hook
/// frame and the error travels with it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The addressed service or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target service has no invocable method with this name.
    #[error("method '{0}' is not available on this service")]
    MethodNotFound(String),

    /// The payload or parameters were rejected (validation failures).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller is not authenticated.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// The caller is authenticated but not allowed to perform the call.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An operation layered outside the engine gave up waiting.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Any other failure raised by a hook or a service method.
    #[error("{0}")]
    General(String),
}

impl ServiceError {
    /// Creates a [`NotFound`](Self::NotFound) error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a [`MethodNotFound`](Self::MethodNotFound) error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound(method.into())
    }

    /// Creates a [`BadRequest`](Self::BadRequest) error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Creates a [`NotAuthenticated`](Self::NotAuthenticated) error.
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::NotAuthenticated(msg.into())
    }

    /// Creates a [`Forbidden`](Self::Forbidden) error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Creates a [`Timeout`](Self::Timeout) error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a [`General`](Self::General) error.
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Default numeric outcome code for this kind.
    ///
    /// A hook may still override the reported code through
    /// [`HookContext::status_code`](crate::HookContext::status_code).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotAuthenticated(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::MethodNotFound(_) => 405,
            ServiceError::Timeout(_) => 408,
            ServiceError::General(_) => 500,
        }
    }

    /// Stable kind name, suitable for structured error bodies.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NotFound",
            ServiceError::MethodNotFound(_) => "MethodNotFound",
            ServiceError::BadRequest(_) => "BadRequest",
            ServiceError::NotAuthenticated(_) => "NotAuthenticated",
            ServiceError::Forbidden(_) => "Forbidden",
            ServiceError::Timeout(_) => "Timeout",
            ServiceError::General(_) => "GeneralError",
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(err.to_string())
    }
}
