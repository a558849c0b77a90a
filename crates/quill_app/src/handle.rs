//! Typed entry points for calling one service through the pipeline.

use quill_service::{HookContext, Id, Params, ServiceError};
use serde_json::Value;

use crate::app::{App, CallArgs};

/// Calls a mounted service by path, running every applicable hook.
///
/// Each method returns the final `result`, or the final `error`, from the
/// call's context. Use [`ServiceHandle::call`] to get the whole context.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    app: App,
    path: String,
}

impl ServiceHandle {
    pub(crate) fn new(app: App, path: &str) -> Self {
        Self {
            app,
            path: path.to_owned(),
        }
    }

    /// The service path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs `method` and returns the final context.
    pub async fn call(&self, method: &str, args: CallArgs) -> HookContext {
        self.app.call(&self.path, method, args).await
    }

    async fn run(&self, method: &str, args: CallArgs) -> Result<Value, ServiceError> {
        self.call(method, args).await.into_result()
    }

    /// `find(params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn find(&self, params: Params) -> Result<Value, ServiceError> {
        self.run("find", CallArgs::new().with_params(params)).await
    }

    /// `get(id, params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn get(&self, id: impl Into<Id>, params: Params) -> Result<Value, ServiceError> {
        self.run("get", CallArgs::new().with_id(id).with_params(params))
            .await
    }

    /// `create(data, params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn create(&self, data: Value, params: Params) -> Result<Value, ServiceError> {
        self.run("create", CallArgs::new().with_data(data).with_params(params))
            .await
    }

    /// `update(id, data, params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn update(
        &self,
        id: impl Into<Id>,
        data: Value,
        params: Params,
    ) -> Result<Value, ServiceError> {
        let args = CallArgs::new()
            .with_id(id)
            .with_data(data)
            .with_params(params);
        self.run("update", args).await
    }

    /// `patch(id, data, params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn patch(
        &self,
        id: impl Into<Id>,
        data: Value,
        params: Params,
    ) -> Result<Value, ServiceError> {
        let args = CallArgs::new()
            .with_id(id)
            .with_data(data)
            .with_params(params);
        self.run("patch", args).await
    }

    /// `remove(id, params)`
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn remove(&self, id: impl Into<Id>, params: Params) -> Result<Value, ServiceError> {
        self.run("remove", CallArgs::new().with_id(id).with_params(params))
            .await
    }

    /// Runs any method with explicit arguments, such as a custom method or a
    /// multi-record `patch` without an identifier.
    ///
    /// # Errors
    ///
    /// Returns the error recorded on the final context.
    pub async fn custom(&self, method: &str, args: CallArgs) -> Result<Value, ServiceError> {
        self.run(method, args).await
    }
}
