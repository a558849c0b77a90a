//! Core infrastructure plugins for Quill.
//!
//! This crate provides plugins most Quill applications want:
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//! - [`TimingPlugin`] - Call duration measurement with a mockable clock
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables [`MockClock`] for deterministic time testing
//!
//! # Example
//!
//! ```no_run
//! use quill_app::App;
//! use quill_core_plugins::{TimingPlugin, TracingPlugin};
//! use tracing::Level;
//!
//! # async fn run() -> Result<(), quill_app::AppError> {
//! let app = App::new();
//! app.add_plugin(TracingPlugin::default().with_level(Level::DEBUG))?
//!     .add_plugin(TimingPlugin::new())?;
//! app.setup().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 3, built only on the public surface of the layers
//! below:
//!
//! - **Layer 1** (`quill_service`): Context, service trait and errors
//! - **Layer 2** (`quill_hooks`, `quill_app`): Pipeline and application
//! - **Layer 3** (plugins): Optional infrastructure

mod timing;
mod tracing_plugin;

pub use timing::{CallTiming, Clock, ClockProvider, TimingLog, TimingPlugin};
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

// Re-export test utilities
#[cfg(any(test, feature = "test-utils"))]
pub use timing::MockClock;
