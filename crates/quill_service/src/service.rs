//! The [`Service`] trait and positional argument reconstruction.
//!
//! A service is a named set of async methods. The six standard methods have
//! fixed argument shapes; anything else is routed through
//! [`Service::custom`]. [`MethodCall`] rebuilds the positional arguments for a
//! method from a [`HookContext`] by naming convention:
//!
//! | method | arguments |
//! |---|---|
//! | `find` | `(params)` |
//! | `get`, `remove` | `(id, params)` |
//! | `create` | `(data, params)` |
//! | `update`, `patch` | `(id, data, params)` |
//! | anything else | `id` if present, `data` if present, `params` |

use core::future::Future;
use core::pin::Pin;

use serde_json::Value;

use crate::application::Application;
use crate::context::HookContext;
use crate::error::ServiceError;
use crate::value::{Id, Params};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a service method.
pub type ServiceResult = Result<Value, ServiceError>;

/// Names of the standard service methods.
pub const STANDARD_METHODS: [&str; 6] = ["find", "get", "create", "update", "patch", "remove"];

/// An application service addressed by path.
///
/// Every method has a default body that fails with
/// [`ServiceError::MethodNotFound`], so implementors override only what they
/// support. [`methods`](Service::methods) must list the names that are
/// actually invocable; the engine refuses to call anything not listed.
///
/// ```ignore
/// struct Echo;
///
/// impl Service for Echo {
///     fn methods(&self) -> Vec<String> {
///         vec!["create".into()]
///     }
///
///     fn create(&self, data: Option<Value>, _params: Params) -> BoxFuture<'_, ServiceResult> {
///         Box::pin(async move { Ok(data.unwrap_or_default()) })
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// Names of the methods this service can execute.
    ///
    /// Defaults to the six standard methods.
    fn methods(&self) -> Vec<String> {
        STANDARD_METHODS.iter().map(|m| (*m).to_owned()).collect()
    }

    /// Returns `true` if `method` is listed in [`methods`](Service::methods).
    fn has_method(&self, method: &str) -> bool {
        self.methods().iter().any(|m| m == method)
    }

    /// Lists records.
    fn find(&self, params: Params) -> BoxFuture<'_, ServiceResult> {
        let _ = params;
        Box::pin(async { Err(ServiceError::method_not_found("find")) })
    }

    /// Fetches one record.
    fn get(&self, id: Option<Id>, params: Params) -> BoxFuture<'_, ServiceResult> {
        let _ = (id, params);
        Box::pin(async { Err(ServiceError::method_not_found("get")) })
    }

    /// Creates a record.
    fn create(&self, data: Option<Value>, params: Params) -> BoxFuture<'_, ServiceResult> {
        let _ = (data, params);
        Box::pin(async { Err(ServiceError::method_not_found("create")) })
    }

    /// Replaces a record.
    fn update(
        &self,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> BoxFuture<'_, ServiceResult> {
        let _ = (id, data, params);
        Box::pin(async { Err(ServiceError::method_not_found("update")) })
    }

    /// Merges into a record.
    fn patch(
        &self,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> BoxFuture<'_, ServiceResult> {
        let _ = (id, data, params);
        Box::pin(async { Err(ServiceError::method_not_found("patch")) })
    }

    /// Deletes a record.
    fn remove(&self, id: Option<Id>, params: Params) -> BoxFuture<'_, ServiceResult> {
        let _ = (id, params);
        Box::pin(async { Err(ServiceError::method_not_found("remove")) })
    }

    /// Executes a non-standard method.
    ///
    /// `id` and `data` are only passed when the context carried them.
    fn custom<'a>(
        &'a self,
        method: &'a str,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> BoxFuture<'a, ServiceResult> {
        let _ = (id, data, params);
        Box::pin(async move { Err(ServiceError::method_not_found(method)) })
    }

    /// Called once when the hosting application sets up.
    fn setup<'a>(
        &'a self,
        app: &'a dyn Application,
        path: &'a str,
    ) -> BoxFuture<'a, Result<(), ServiceError>> {
        let _ = (app, path);
        Box::pin(async { Ok(()) })
    }

    /// Called once when the hosting application tears down.
    fn teardown<'a>(
        &'a self,
        app: &'a dyn Application,
        path: &'a str,
    ) -> BoxFuture<'a, Result<(), ServiceError>> {
        let _ = (app, path);
        Box::pin(async { Ok(()) })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodCall
// ─────────────────────────────────────────────────────────────────────────────

/// Positional arguments for one service method, reconstructed from a context.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
    /// `find(params)`
    Find {
        /// Call parameters.
        params: Params,
    },
    /// `get(id, params)`
    Get {
        /// Record identifier.
        id: Option<Id>,
        /// Call parameters.
        params: Params,
    },
    /// `create(data, params)`
    Create {
        /// Payload.
        data: Option<Value>,
        /// Call parameters.
        params: Params,
    },
    /// `update(id, data, params)`
    Update {
        /// Record identifier.
        id: Option<Id>,
        /// Payload.
        data: Option<Value>,
        /// Call parameters.
        params: Params,
    },
    /// `patch(id, data, params)`
    Patch {
        /// Record identifier.
        id: Option<Id>,
        /// Payload.
        data: Option<Value>,
        /// Call parameters.
        params: Params,
    },
    /// `remove(id, params)`
    Remove {
        /// Record identifier.
        id: Option<Id>,
        /// Call parameters.
        params: Params,
    },
    /// Any other method name.
    Custom {
        /// Method name.
        method: String,
        /// Identifier, only when the context carried one.
        id: Option<Id>,
        /// Payload, only when the context carried one.
        data: Option<Value>,
        /// Call parameters.
        params: Params,
    },
}

impl MethodCall {
    /// Builds the argument list for `ctx.method` from the context fields.
    #[must_use]
    pub fn from_context(ctx: &HookContext) -> Self {
        let params = ctx.params.clone();
        let id = ctx.id.clone();
        let data = ctx.data.clone();

        match ctx.method.as_str() {
            "find" => MethodCall::Find { params },
            "get" => MethodCall::Get { id, params },
            "create" => MethodCall::Create { data, params },
            "update" => MethodCall::Update { id, data, params },
            "patch" => MethodCall::Patch { id, data, params },
            "remove" => MethodCall::Remove { id, params },
            other => MethodCall::Custom {
                method: other.to_owned(),
                id,
                data,
                params,
            },
        }
    }

    /// The method name this call targets.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            MethodCall::Find { .. } => "find",
            MethodCall::Get { .. } => "get",
            MethodCall::Create { .. } => "create",
            MethodCall::Update { .. } => "update",
            MethodCall::Patch { .. } => "patch",
            MethodCall::Remove { .. } => "remove",
            MethodCall::Custom { method, .. } => method,
        }
    }

    /// Invokes the call against `service`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the service method produces.
    pub async fn invoke(self, service: &dyn Service) -> ServiceResult {
        match self {
            MethodCall::Find { params } => service.find(params).await,
            MethodCall::Get { id, params } => service.get(id, params).await,
            MethodCall::Create { data, params } => service.create(data, params).await,
            MethodCall::Update { id, data, params } => service.update(id, data, params).await,
            MethodCall::Patch { id, data, params } => service.patch(id, data, params).await,
            MethodCall::Remove { id, params } => service.remove(id, params).await,
            MethodCall::Custom {
                method,
                id,
                data,
                params,
            } => service.custom(&method, id, data, params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Archive;

    impl Service for Archive {
        fn methods(&self) -> Vec<String> {
            vec!["get".into(), "archive".into()]
        }

        fn get(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
            Box::pin(async move { Ok(json!({ "id": id.map(|i| i.to_value()) })) })
        }

        fn custom<'a>(
            &'a self,
            method: &'a str,
            id: Option<Id>,
            data: Option<Value>,
            params: Params,
        ) -> BoxFuture<'a, ServiceResult> {
            Box::pin(async move {
                Ok(json!({
                    "method": method,
                    "id": id.map(|i| i.to_value()),
                    "data": data,
                    "params": params.len(),
                }))
            })
        }
    }

    #[test]
    fn arguments_follow_method_name() {
        let ctx = HookContext::detached("messages", "update")
            .with_id(3)
            .with_data(json!({"text": "hi"}));
        assert_eq!(
            MethodCall::from_context(&ctx),
            MethodCall::Update {
                id: Some(Id::Num(3)),
                data: Some(json!({"text": "hi"})),
                params: Params::new(),
            }
        );

        let ctx = HookContext::detached("messages", "find").with_id(3);
        assert_eq!(
            MethodCall::from_context(&ctx),
            MethodCall::Find {
                params: Params::new()
            }
        );
    }

    #[test]
    fn custom_keeps_only_present_fields() {
        let ctx = HookContext::detached("messages", "archive").with_data(json!(true));
        let call = MethodCall::from_context(&ctx);
        assert_eq!(call.method(), "archive");
        assert!(matches!(
            call,
            MethodCall::Custom { id: None, data: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn invoke_routes_to_service_methods() {
        let ctx = HookContext::detached("archive", "get").with_id("a1");
        let out = MethodCall::from_context(&ctx).invoke(&Archive).await;
        assert_eq!(out, Ok(json!({"id": "a1"})));

        let ctx = HookContext::detached("archive", "archive").with_id(9);
        let out = MethodCall::from_context(&ctx).invoke(&Archive).await;
        assert_eq!(
            out,
            Ok(json!({"method": "archive", "id": 9, "data": null, "params": 0}))
        );
    }

    #[tokio::test]
    async fn unimplemented_methods_fail_with_method_not_found() {
        let ctx = HookContext::detached("archive", "remove").with_id(1);
        let out = MethodCall::from_context(&ctx).invoke(&Archive).await;
        assert_eq!(out, Err(ServiceError::method_not_found("remove")));
        assert!(!Archive.has_method("remove"));
        assert!(Archive.has_method("archive"));
    }
}
