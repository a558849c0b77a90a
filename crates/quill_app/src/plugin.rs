//! Plugin system for extending an application.
//!
//! Plugins bundle hooks, services and settings behind one value. The
//! application drives a small lifecycle:
//!
//! 1. **Build** - `build()` runs immediately when the plugin is added
//! 2. **Ready** - `ready()` runs during [`App::setup`], in the order plugins were added
//! 3. **Cleanup** - `cleanup()` runs during [`App::teardown`], in reverse order
//!
//! # Example
//!
//! ```ignore
//! use quill_app::{App, Plugin, PluginId};
//! use quill_hooks::HookRegistration;
//!
//! struct AuditPlugin;
//!
//! impl Plugin for AuditPlugin {
//!     fn build(&self, app: &App) {
//!         app.hooks([HookRegistration::after(|ctx| {
//!             Box::pin(async move {
//!                 tracing::info!(path = %ctx.path, method = %ctx.method, "audited");
//!                 Ok(None)
//!             })
//!         })]);
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<TracingPlugin>()]
//!     }
//! }
//!
//! let app = App::new();
//! app.add_plugin(TracingPlugin::default())?;
//! app.add_plugin(AuditPlugin)?;
//! ```

use core::any::TypeId;
use std::sync::Arc;

use crate::app::App;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency checks and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of application configuration.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the application. Called once, when the plugin is added.
    ///
    /// Register hooks, mount services and write settings here.
    fn build(&self, app: &App);

    /// Called from [`App::setup`] after every plugin has been built.
    fn ready(&self, _app: &App) {}

    /// Called from [`App::teardown`], in reverse order of addition.
    fn cleanup(&self, _app: &App) {}

    /// Returns the plugin's name for diagnostics.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Plugins that must already be added when this one is added.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    ///
    /// Default is `true`.
    fn is_unique(&self) -> bool {
        true
    }
}

/// A registered plugin.
pub(crate) struct PluginEntry {
    pub(crate) id: PluginId,
    pub(crate) plugin: Arc<dyn Plugin>,
}
