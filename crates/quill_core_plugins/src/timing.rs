//! Call timing plugin and clock.
//!
//! Provides [`TimingPlugin`], which wraps every matching call in a global
//! around hook and measures how long the rest of the around chain and the
//! service method take:
//! - [`Clock`] - Time source, mockable for testing
//! - [`TimingLog`] - Bounded record of recent call timings
//!
//! Because the hook lives in the global around layer it wraps every around
//! hook registered after it, plus the service method. Before and after hooks
//! are not measured.
//!
//! # Example
//!
//! ```ignore
//! let timing = TimingPlugin::new().for_path("messages");
//! let log = timing.log();
//! app.add_plugin(timing)?;
//!
//! app.service("messages").find(Params::new()).await?;
//! for record in log.records() {
//!     println!("{} {} took {:?}", record.path, record.method, record.elapsed);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use quill_app::{App, Plugin};
use quill_hooks::{HookRegistration, Pattern};

// ─────────────────────────────────────────────────────────────────────────────
// ClockProvider Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for providing current time.
///
/// Implement this for custom time providers (e.g., a mock clock in tests).
///
/// ```
/// use std::time::Instant;
/// use quill_core_plugins::ClockProvider;
///
/// /// A clock that always returns a fixed instant.
/// struct FixedClock(Instant);
///
/// impl ClockProvider for FixedClock {
///     fn now(&self) -> Instant {
///         self.0
///     }
/// }
/// ```
pub trait ClockProvider: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// System clock provider using `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable time source.
///
/// Uses the system clock by default, but can be built from any
/// [`ClockProvider`].
#[derive(Clone)]
pub struct Clock {
    provider: Arc<dyn ClockProvider>,
}

impl Clock {
    /// Creates a clock backed by the system clock.
    #[must_use]
    pub fn system() -> Self {
        Self {
            provider: Arc::new(SystemClock),
        }
    }

    /// Creates a clock with a custom provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self { provider }
    }

    /// Returns the current instant.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.provider.now()
    }

    /// Returns the duration elapsed since the given instant.
    ///
    /// Saturates to zero if `earlier` is in the future.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Clock").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TimingLog
// ─────────────────────────────────────────────────────────────────────────────

/// Timing of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTiming {
    /// Service path.
    pub path: String,
    /// Method name.
    pub method: String,
    /// Time spent in the wrapped part of the around chain.
    pub elapsed: Duration,
    /// Whether the call carried an error when the chain returned.
    pub failed: bool,
}

/// Shared, bounded record of recent call timings.
///
/// Cheap to clone; clones share the same records. Once full, the oldest
/// record is dropped for each new one.
#[derive(Debug, Clone)]
pub struct TimingLog {
    records: Arc<Mutex<VecDeque<CallTiming>>>,
    capacity: usize,
}

impl TimingLog {
    /// Default number of records kept.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates an empty log keeping at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, timing: CallTiming) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(timing);
    }

    /// Snapshot of the kept records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<CallTiming> {
        self.records.lock().iter().cloned().collect()
    }

    /// The most recent record.
    #[must_use]
    pub fn last(&self) -> Option<CallTiming> {
        self.records.lock().back().cloned()
    }

    /// Number of kept records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for TimingLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TimingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Measures call duration with a global around hook.
///
/// Each measured call is logged at `debug` and appended to the plugin's
/// [`TimingLog`]. With [`with_params_key`](Self::with_params_key) the
/// elapsed microseconds are also written into the call's params, where
/// `after` hooks can read them.
///
/// # Testing with a mock clock
///
/// ```ignore
/// let mock = Arc::new(MockClock::new(Instant::now()));
/// let timing = TimingPlugin::with_clock(mock.clone());
/// ```
#[derive(Debug, Clone)]
pub struct TimingPlugin {
    clock: Clock,
    path: Pattern,
    params_key: Option<String>,
    log: TimingLog,
}

impl Default for TimingPlugin {
    fn default() -> Self {
        Self {
            clock: Clock::system(),
            path: Pattern::Any,
            params_key: None,
            log: TimingLog::default(),
        }
    }
}

impl TimingPlugin {
    /// Creates a timing plugin using the system clock for every path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a timing plugin with a custom clock provider.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn ClockProvider>) -> Self {
        Self {
            clock: Clock::with_provider(clock),
            ..Self::default()
        }
    }

    /// Only measures calls to matching paths.
    #[must_use]
    pub fn for_path(mut self, pattern: impl Into<Pattern>) -> Self {
        self.path = pattern.into();
        self
    }

    /// Writes the elapsed microseconds into `ctx.params[key]`.
    #[must_use]
    pub fn with_params_key(mut self, key: impl Into<String>) -> Self {
        self.params_key = Some(key.into());
        self
    }

    /// Replaces the timing log, e.g. to change its capacity.
    #[must_use]
    pub fn with_log(mut self, log: TimingLog) -> Self {
        self.log = log;
        self
    }

    /// Handle to the records this plugin writes.
    #[must_use]
    pub fn log(&self) -> TimingLog {
        self.log.clone()
    }

    fn registration(&self) -> HookRegistration {
        let clock = self.clock.clone();
        let log = self.log.clone();
        let params_key = self.params_key.clone();

        HookRegistration::around(move |ctx, next| {
            let clock = clock.clone();
            let log = log.clone();
            let params_key = params_key.clone();
            Box::pin(async move {
                let start = clock.now();
                next.run(ctx).await;
                let elapsed = clock.elapsed_since(start);
                let failed = ctx.has_error();

                tracing::debug!(
                    path = %ctx.path,
                    method = %ctx.method,
                    ?elapsed,
                    failed,
                    "call timed"
                );
                if let Some(key) = params_key {
                    let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
                    ctx.params.insert(key, micros);
                }
                log.push(CallTiming {
                    path: ctx.path.clone(),
                    method: ctx.method.clone(),
                    elapsed,
                    failed,
                });
                Ok(())
            })
        })
        .for_path(self.path.clone())
        .named("timing")
    }
}

impl Plugin for TimingPlugin {
    fn build(&self, app: &App) {
        app.hooks([self.registration()]);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MockClock for Testing
// ─────────────────────────────────────────────────────────────────────────────

/// Mock clock for testing with controllable time.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockClock {
    current: parking_lot::RwLock<Instant>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Creates a mock clock set to the given instant.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.write() += duration;
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.current.write() = instant;
    }

    /// Returns the current instant.
    #[must_use]
    pub fn current(&self) -> Instant {
        *self.current.read()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> Instant {
        self.current()
    }
}
