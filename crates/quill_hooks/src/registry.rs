//! Hook registries and per-call filtering.

use quill_service::HookPhase;

use crate::hook::HookRegistration;

/// An ordered, append-only list of hook registrations.
///
/// One registry backs each layer: the global layer, the interceptor layer, and
/// one per mounted service.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<HookRegistration>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration.
    pub fn register(&mut self, registration: HookRegistration) {
        self.hooks.push(registration);
    }

    /// Appends registrations, in order.
    pub fn extend(&mut self, registrations: impl IntoIterator<Item = HookRegistration>) {
        self.hooks.extend(registrations);
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Iterates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HookRegistration> {
        self.hooks.iter()
    }

    /// Buckets the registrations that apply to `(path, method)` by phase.
    #[must_use]
    pub fn filter(&self, path: &str, method: &str) -> PhaseHooks {
        self.hooks
            .iter()
            .filter(|reg| reg.applies_to(path, method))
            .cloned()
            .collect()
    }

    /// Buckets the registrations whose method pattern matches, ignoring the
    /// path. Used for per-service registries.
    #[must_use]
    pub fn filter_method(&self, method: &str) -> PhaseHooks {
        self.hooks
            .iter()
            .filter(|reg| reg.applies_to_method(method))
            .cloned()
            .collect()
    }
}

impl FromIterator<HookRegistration> for HookRegistry {
    fn from_iter<I: IntoIterator<Item = HookRegistration>>(iter: I) -> Self {
        Self {
            hooks: iter.into_iter().collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PhaseHooks
// ─────────────────────────────────────────────────────────────────────────────

/// Registrations applicable to one call, bucketed by phase.
///
/// Each bucket keeps registration order.
#[derive(Debug, Clone, Default)]
pub struct PhaseHooks {
    before: Vec<HookRegistration>,
    after: Vec<HookRegistration>,
    error: Vec<HookRegistration>,
    around: Vec<HookRegistration>,
}

impl PhaseHooks {
    /// Creates empty buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration to the bucket for its phase.
    pub fn push(&mut self, registration: HookRegistration) {
        self.bucket_mut(registration.phase()).push(registration);
    }

    /// The bucket for `phase`.
    #[must_use]
    pub fn get(&self, phase: HookPhase) -> &[HookRegistration] {
        match phase {
            HookPhase::Before => &self.before,
            HookPhase::After => &self.after,
            HookPhase::Error => &self.error,
            HookPhase::Around => &self.around,
        }
    }

    /// `before` bucket.
    #[must_use]
    pub fn before(&self) -> &[HookRegistration] {
        &self.before
    }

    /// `after` bucket.
    #[must_use]
    pub fn after(&self) -> &[HookRegistration] {
        &self.after
    }

    /// `error` bucket.
    #[must_use]
    pub fn error(&self) -> &[HookRegistration] {
        &self.error
    }

    /// `around` bucket.
    #[must_use]
    pub fn around(&self) -> &[HookRegistration] {
        &self.around
    }

    /// Total registrations across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len() + self.error.len() + self.around.len()
    }

    /// Returns `true` if every bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, phase: HookPhase) -> &mut Vec<HookRegistration> {
        match phase {
            HookPhase::Before => &mut self.before,
            HookPhase::After => &mut self.after,
            HookPhase::Error => &mut self.error,
            HookPhase::Around => &mut self.around,
        }
    }
}

impl FromIterator<HookRegistration> for PhaseHooks {
    fn from_iter<I: IntoIterator<Item = HookRegistration>>(iter: I) -> Self {
        let mut hooks = Self::new();
        for registration in iter {
            hooks.push(registration);
        }
        hooks
    }
}
