//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which configures the `tracing` subscriber and
//! publishes its configuration in the application settings.
//!
//! # Lifecycle
//!
//! - **`build()`** writes the [`TracingConfig`] under the
//!   [`"tracing"`](TracingConfig::SETTING) setting, unless the settings
//!   already carry one (for example from [`App::load_settings_json`]).
//! - **`ready()`** reads the setting back and installs the subscriber. Other
//!   plugins and settings loaded after `build()` can still change the
//!   configuration before anything is installed.
//!
//! # Example
//!
//! ```no_run
//! use quill_app::App;
//! use quill_core_plugins::{TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! # async fn run() -> Result<(), quill_app::AppError> {
//! let app = App::new();
//! app.add_plugin(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! )?;
//! app.setup().await?;
//! # Ok(())
//! # }
//! ```

use quill_app::{App, Plugin};
use quill_service::Application;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration, stored in the application settings.
///
/// Hooks can read it through [`Application::setting`] to adapt their logging:
///
/// ```ignore
/// HookRegistration::before(|ctx| {
///     Box::pin(async move {
///         let verbose = TracingConfig::from_app(ctx.app.as_ref())
///             .ok()
///             .flatten()
///             .is_some_and(|config| config.level >= Level::DEBUG);
///         if verbose {
///             tracing::debug!(params = ?ctx.params, "incoming call");
///         }
///         Ok(None)
///     })
/// })
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Maximum log level.
    #[serde(with = "level_name")]
    pub level: Level,
    /// Output format.
    #[serde(default)]
    pub format: TracingFormat,
    /// Target-specific filter directives (e.g. `"quill_hooks=trace,info"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_filter: Option<String>,
    /// Whether span enter/exit events are printed.
    #[serde(default)]
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Settings key the configuration is stored under.
    pub const SETTING: &'static str = "tracing";

    /// Reads the configuration from the application settings.
    ///
    /// Returns `Ok(None)` when the setting is absent.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the setting is present but malformed.
    pub fn from_app(app: &dyn Application) -> Result<Option<Self>, serde_json::Error> {
        app.setting(Self::SETTING)
            .map(serde_json::from_value)
            .transpose()
    }

    /// Builds the subscriber filter.
    ///
    /// Invalid directives fall back to the plain level.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives)
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }

    /// Installs a global subscriber for this configuration.
    ///
    /// Returns `false` if a global subscriber was already installed.
    pub fn install(&self) -> bool {
        let filter = self.filter();
        let span_events = self.span_events();

        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        };
        installed.is_ok()
    }
}

mod level_name {
    use core::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer, de};
    use tracing::Level;

    pub(super) fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        Level::from_str(&name).map_err(de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Configures the `tracing` subscriber. Uses the [`tracing`] and
/// [`tracing_subscriber`] crates under the hood.
///
/// # Settings Provided
///
/// | Key | Value |
/// |-----|-------|
/// | `"tracing"` | [`TracingConfig`] as JSON |
///
/// # Configuration Options
///
/// ```
/// use quill_core_plugins::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// // Development: pretty output with span enter/exit
/// let dev = TracingPlugin::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output for log aggregation
/// let prod = TracingPlugin::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("quill_hooks=warn,info");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TracingPlugin {
    config: TracingConfig,
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Sets target-specific filter directives.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.config.span_events = enabled;
        self
    }

    /// The configuration this plugin publishes.
    #[must_use]
    pub fn config(&self) -> &TracingConfig {
        &self.config
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, app: &App) {
        if app.get(TracingConfig::SETTING).is_some() {
            return;
        }
        match serde_json::to_value(&self.config) {
            Ok(value) => {
                app.set(TracingConfig::SETTING, value);
            }
            Err(err) => tracing::warn!(error = %err, "could not publish tracing settings"),
        }
    }

    fn ready(&self, app: &App) {
        let (config, invalid) = match TracingConfig::from_app(app) {
            Ok(Some(config)) => (config, None),
            Ok(None) => (self.config.clone(), None),
            Err(err) => (self.config.clone(), Some(err)),
        };

        if !config.install() {
            tracing::debug!("global subscriber already installed");
        }
        if let Some(err) = invalid {
            tracing::warn!(error = %err, "ignoring malformed tracing settings");
        }

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _app: &App) {
        tracing::info!("TracingPlugin shutting down");
    }
}
