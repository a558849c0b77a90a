//! The hosting application.
//!
//! [`App`] owns the mounted services, the three hook layers, settings and
//! plugins. Everything sits behind read-mostly locks: registration takes a
//! write lock, and every call takes a filtered snapshot under a read lock,
//! releases it, and only then runs the pipeline. A registration racing with
//! an in-flight call therefore affects only later calls.
//!
//! # Example
//!
//! ```ignore
//! let app = App::new();
//! app.mount("messages", MessageService::default())?;
//! app.hooks([HookRegistration::before(stamp_start)]);
//! app.service_hooks("messages", [HookRegistration::after(log_duration)])?;
//!
//! app.setup().await?;
//! let message = app.service("messages").get(1, Params::new()).await?;
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;
use indexmap::IndexMap;
use parking_lot::RwLock;
use quill_hooks::{CallHooks, Dispatcher, HookRegistration, HookRegistry};
use quill_service::{Application, HookContext, Id, Params, Service, ServiceError};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::handle::ServiceHandle;
use crate::plugin::{Plugin, PluginEntry, PluginId};

/// Strips leading and trailing slashes from a service path.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

// ─────────────────────────────────────────────────────────────────────────────
// CallArgs
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for a programmatic call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Record identifier.
    pub id: Option<Id>,
    /// Payload.
    pub data: Option<Value>,
    /// Parameters.
    pub params: Params,
}

impl CallArgs {
    /// Creates empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App
// ─────────────────────────────────────────────────────────────────────────────

struct ServiceEntry {
    service: Arc<dyn Service>,
    hooks: HookRegistry,
}

struct AppInner {
    services: RwLock<IndexMap<String, ServiceEntry>>,
    global: RwLock<HookRegistry>,
    interceptors: RwLock<HookRegistry>,
    settings: RwLock<Map<String, Value>>,
    plugins: RwLock<Vec<PluginEntry>>,
    plugin_ids: RwLock<HashSet<PluginId>>,
    dispatcher: Dispatcher,
}

impl Application for AppInner {
    fn service(&self, path: &str) -> Option<Arc<dyn Service>> {
        self.services
            .read()
            .get(normalize_path(path))
            .map(|entry| Arc::clone(&entry.service))
    }

    fn setting(&self, key: &str) -> Option<Value> {
        self.settings.read().get(key).cloned()
    }
}

/// Cheaply cloneable handle to an application.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("services", &self.service_names())
            .field("global_hooks", &self.inner.global.read().len())
            .field("interceptors", &self.inner.interceptors.read().len())
            .field("plugins", &self.inner.plugins.read().len())
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}

impl App {
    /// Creates an empty application with the default dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dispatcher(Dispatcher::new())
    }

    /// Creates an empty application with a configured dispatcher.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(AppInner {
                services: RwLock::new(IndexMap::new()),
                global: RwLock::new(HookRegistry::new()),
                interceptors: RwLock::new(HookRegistry::new()),
                settings: RwLock::new(Map::new()),
                plugins: RwLock::new(Vec::new()),
                plugin_ids: RwLock::new(HashSet::new()),
                dispatcher,
            }),
        }
    }

    /// The dispatcher used for every call.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    /// Mounts `service` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicatePath`] if the path is taken.
    pub fn mount<S: Service>(&self, path: &str, service: S) -> Result<ServiceHandle, AppError> {
        self.mount_arc(path, Arc::new(service))
    }

    /// Mounts an already shared service at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicatePath`] if the path is taken.
    pub fn mount_arc(
        &self,
        path: &str,
        service: Arc<dyn Service>,
    ) -> Result<ServiceHandle, AppError> {
        let path = normalize_path(path);
        let mut services = self.inner.services.write();
        if services.contains_key(path) {
            return Err(AppError::DuplicatePath(path.to_owned()));
        }
        services.insert(
            path.to_owned(),
            ServiceEntry {
                service,
                hooks: HookRegistry::new(),
            },
        );
        tracing::debug!(path, "service mounted");
        Ok(ServiceHandle::new(self.clone(), path))
    }

    /// Removes the service at `path` together with its hooks.
    ///
    /// Returns the removed service so the caller can tear it down.
    pub fn unmount(&self, path: &str) -> Option<Arc<dyn Service>> {
        let path = normalize_path(path);
        let removed = self.inner.services.write().shift_remove(path);
        if removed.is_some() {
            tracing::debug!(path, "service unmounted");
        }
        removed.map(|entry| entry.service)
    }

    /// Paths of mounted services, in mount order.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        self.inner.services.read().keys().cloned().collect()
    }

    /// Returns `true` if a service is mounted at `path`.
    #[must_use]
    pub fn has_service(&self, path: &str) -> bool {
        self.inner.services.read().contains_key(normalize_path(path))
    }

    /// Handle for calling the service at `path` through the pipeline.
    ///
    /// The path is not checked; calls through a handle to an unmounted path
    /// fail with [`ServiceError::NotFound`].
    #[must_use]
    pub fn service(&self, path: &str) -> ServiceHandle {
        ServiceHandle::new(self.clone(), normalize_path(path))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers application-wide hooks.
    pub fn hooks(&self, registrations: impl IntoIterator<Item = HookRegistration>) -> &Self {
        self.inner.global.write().extend(registrations);
        self
    }

    /// Registers interceptor-layer hooks.
    pub fn interceptors(
        &self,
        registrations: impl IntoIterator<Item = HookRegistration>,
    ) -> &Self {
        self.inner.interceptors.write().extend(registrations);
        self
    }

    /// Registers hooks for the service at `path`.
    ///
    /// Path patterns on these registrations are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownService`] if nothing is mounted at `path`.
    pub fn service_hooks(
        &self,
        path: &str,
        registrations: impl IntoIterator<Item = HookRegistration>,
    ) -> Result<&Self, AppError> {
        let path = normalize_path(path);
        let mut services = self.inner.services.write();
        let entry = services
            .get_mut(path)
            .ok_or_else(|| AppError::UnknownService(path.to_owned()))?;
        entry.hooks.extend(registrations);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs `method` on the service at `path` through the full pipeline and
    /// returns the final context.
    ///
    /// An unmounted path produces a context that starts in the error phase
    /// with [`ServiceError::NotFound`], so only global and interceptor error
    /// hooks see it.
    pub async fn call(&self, path: &str, method: &str, args: CallArgs) -> HookContext {
        let path = normalize_path(path);
        let app: Arc<dyn Application> = self.inner.clone();
        let mut ctx = HookContext::new(app, path, method).with_params(args.params);
        ctx.id = args.id;
        ctx.data = args.data;

        let hooks = {
            let services = self.inner.services.read();
            let global = self.inner.global.read();
            let interceptors = self.inner.interceptors.read();
            let entry = services.get(path);

            match entry {
                Some(entry) => ctx = ctx.with_service(Arc::clone(&entry.service)),
                None => {
                    tracing::debug!(path, method, "no service mounted");
                    ctx = ctx.failed(ServiceError::not_found(format!(
                        "no service is mounted at '{path}'"
                    )));
                }
            }

            CallHooks::resolve(
                &global,
                &interceptors,
                entry.map(|entry| &entry.hooks),
                path,
                method,
            )
        };

        self.inner.dispatcher.run(&hooks, ctx).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Writes a setting, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.settings.write().insert(key.into(), value.into())
    }

    /// Reads a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.settings.read().get(key).cloned()
    }

    /// Merges `settings` into the application settings.
    #[must_use]
    pub fn with_settings(self, settings: Map<String, Value>) -> Self {
        self.inner.settings.write().extend(settings);
        self
    }

    /// Merges settings from a JSON object document.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidSettings`] if `json` does not parse or is
    /// not an object.
    pub fn load_settings_json(&self, json: &str) -> Result<(), AppError> {
        let Value::Object(settings) = serde_json::from_str::<Value>(json)? else {
            return Err(AppError::InvalidSettings(
                "settings document must be a JSON object".to_owned(),
            ));
        };
        self.inner.settings.write().extend(settings);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugins
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin and runs its `build()` immediately.
    ///
    /// # Errors
    ///
    /// - [`AppError::DuplicatePlugin`] if a unique plugin was already added.
    /// - [`AppError::MissingDependency`] if a dependency was not added first.
    pub fn add_plugin<P: Plugin>(&self, plugin: P) -> Result<&Self, AppError> {
        let id = PluginId::of::<P>();
        let name = plugin.name().to_owned();

        {
            let mut ids = self.inner.plugin_ids.write();
            if plugin.is_unique() && ids.contains(&id) {
                return Err(AppError::DuplicatePlugin(name));
            }
            let missing = plugin.dependencies().into_iter().find(|dep| !ids.contains(dep));
            if let Some(missing) = missing {
                return Err(AppError::MissingDependency {
                    plugin: name,
                    dependency: missing.type_name(),
                });
            }
            ids.insert(id);
        }

        plugin.build(self);
        self.inner.plugins.write().push(PluginEntry {
            id,
            plugin: Arc::new(plugin),
        });
        tracing::debug!(plugin = %name, "plugin built");
        Ok(self)
    }

    /// Returns true if a plugin of type `P` has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.inner.plugin_ids.read().contains(&PluginId::of::<P>())
    }

    fn plugin_snapshot(&self) -> Vec<(PluginId, Arc<dyn Plugin>)> {
        self.inner
            .plugins
            .read()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.plugin)))
            .collect()
    }

    fn service_snapshot(&self) -> Vec<(String, Arc<dyn Service>)> {
        self.inner
            .services
            .read()
            .iter()
            .map(|(path, entry)| (path.clone(), Arc::clone(&entry.service)))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Readies plugins in order, then sets up services in mount order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceSetup`] for the first service whose setup
    /// fails.
    pub async fn setup(&self) -> Result<(), AppError> {
        for (id, plugin) in self.plugin_snapshot() {
            tracing::trace!(plugin = id.type_name(), "ready");
            plugin.ready(self);
        }

        for (path, service) in self.service_snapshot() {
            service
                .setup(&*self.inner, &path)
                .await
                .map_err(|source| AppError::ServiceSetup {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path, "service set up");
        }
        Ok(())
    }

    /// Tears down services in reverse mount order, then cleans up plugins in
    /// reverse order.
    ///
    /// Every service is torn down even if one fails; the first failure is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceTeardown`] for the first failing service.
    pub async fn teardown(&self) -> Result<(), AppError> {
        let mut first_error = None;
        for (path, service) in self.service_snapshot().into_iter().rev() {
            if let Err(source) = service.teardown(&*self.inner, &path).await {
                tracing::warn!(path = %path, error = %source, "service teardown failed");
                first_error.get_or_insert(AppError::ServiceTeardown { path, source });
            }
        }

        for (_, plugin) in self.plugin_snapshot().into_iter().rev() {
            plugin.cleanup(self);
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Application for App {
    fn service(&self, path: &str) -> Option<Arc<dyn Service>> {
        self.inner.service(path)
    }

    fn setting(&self, key: &str) -> Option<Value> {
        self.inner.setting(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_service::{BoxFuture, ServiceResult};
    use serde_json::json;

    struct Static;

    impl Service for Static {
        fn find(&self, _params: Params) -> BoxFuture<'_, ServiceResult> {
            Box::pin(async { Ok(json!(["a", "b"])) })
        }
    }

    #[test]
    fn mount_normalises_paths() {
        let app = App::new();
        app.mount("/messages/", Static).unwrap();

        assert!(app.has_service("messages"));
        assert!(app.has_service("/messages"));
        assert_eq!(app.service_names(), ["messages"]);
    }

    #[test]
    fn duplicate_mount_is_rejected() {
        let app = App::new();
        app.mount("messages", Static).unwrap();
        let err = app.mount("messages/", Static).unwrap_err();
        assert!(matches!(err, AppError::DuplicatePath(path) if path == "messages"));
    }

    #[test]
    fn unmount_drops_service_and_hooks() {
        let app = App::new();
        app.mount("messages", Static).unwrap();
        app.service_hooks(
            "messages",
            [HookRegistration::before(|_| Box::pin(async { Ok(None) }))],
        )
        .unwrap();

        assert!(app.unmount("messages").is_some());
        assert!(!app.has_service("messages"));
        assert!(app.unmount("messages").is_none());
        assert!(matches!(
            app.service_hooks("messages", []),
            Err(AppError::UnknownService(_))
        ));
    }

    #[test]
    fn settings_round_trip_through_application() {
        let app = App::new().with_settings(Map::from_iter([("port".to_owned(), json!(3030))]));
        app.set("name", "quill");
        app.load_settings_json(r#"{"paginate": {"default": 10}}"#).unwrap();

        assert_eq!(app.get("port"), Some(json!(3030)));
        assert_eq!(Application::setting(&app, "name"), Some(json!("quill")));
        assert_eq!(app.get("paginate"), Some(json!({"default": 10})));
    }

    #[test]
    fn non_object_settings_are_rejected() {
        let app = App::new();
        assert!(matches!(
            app.load_settings_json("[1, 2]"),
            Err(AppError::InvalidSettings(_))
        ));
        assert!(matches!(
            app.load_settings_json("{oops"),
            Err(AppError::InvalidSettings(_))
        ));
    }

    #[tokio::test]
    async fn call_reaches_service() {
        let app = App::new();
        app.mount("letters", Static).unwrap();

        let ctx = app.call("/letters", "find", CallArgs::new()).await;
        assert_eq!(ctx.path, "letters");
        assert_eq!(ctx.result, Some(json!(["a", "b"])));
        assert!(Application::service(&app, "letters").is_some());
    }

    #[tokio::test]
    async fn unknown_path_yields_not_found() {
        let app = App::new();
        let ctx = app.call("ghosts", "find", CallArgs::new()).await;

        assert!(ctx.service.is_none());
        assert_eq!(
            ctx.error,
            Some(ServiceError::not_found("no service is mounted at 'ghosts'"))
        );
        assert_eq!(ctx.effective_status(), Some(404));
    }
}
