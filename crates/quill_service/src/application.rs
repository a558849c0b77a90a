//! Capabilities a hook can reach through `ctx.app`.

use std::sync::Arc;

use serde_json::Value;

use crate::service::Service;

/// The hosting application, as seen from inside a call.
///
/// Hooks use it to look up sibling services or read settings.
pub trait Application: Send + Sync + 'static {
    /// Looks up a mounted service by path.
    fn service(&self, path: &str) -> Option<Arc<dyn Service>>;

    /// Reads a setting.
    fn setting(&self, key: &str) -> Option<Value>;
}

/// An application with no services and no settings.
///
/// Used for contexts built outside a hosting application, such as when the
/// dispatch engine is driven directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoApp;

impl Application for NoApp {
    fn service(&self, _path: &str) -> Option<Arc<dyn Service>> {
        None
    }

    fn setting(&self, _key: &str) -> Option<Value> {
        None
    }
}
