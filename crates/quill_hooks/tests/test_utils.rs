//! Shared test utilities for `quill_hooks` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quill_hooks::prelude::*;
use serde_json::{Value, json};

// ═══════════════════════════════════════════════════════════════════════════════
// TRACE
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered log of hook and service activity.
#[derive(Clone, Default)]
pub struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().unwrap().iter().any(|e| e == entry)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOOK BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Standard hook for `phase` that appends `label` to the trace.
pub fn traced(phase: HookPhase, trace: &Trace, label: &str) -> HookRegistration {
    let trace = trace.clone();
    let label = label.to_owned();
    let hook = HookFn::standard(move |_ctx| {
        let trace = trace.clone();
        let label = label.clone();
        Box::pin(async move {
            trace.push(label);
            Ok(None)
        })
    });
    HookRegistration::new(phase, hook)
}

pub fn before(trace: &Trace, label: &str) -> HookRegistration {
    traced(HookPhase::Before, trace, label)
}

pub fn after(trace: &Trace, label: &str) -> HookRegistration {
    traced(HookPhase::After, trace, label)
}

pub fn error(trace: &Trace, label: &str) -> HookRegistration {
    traced(HookPhase::Error, trace, label)
}

/// Standard hook for `phase` that traces `label` and then fails.
pub fn failing(phase: HookPhase, trace: &Trace, label: &str) -> HookRegistration {
    let trace = trace.clone();
    let label = label.to_owned();
    let hook = HookFn::standard(move |_ctx| {
        let trace = trace.clone();
        let label = label.clone();
        Box::pin(async move {
            trace.push(label.clone());
            Err(ServiceError::general(label))
        })
    });
    HookRegistration::new(phase, hook)
}

/// Standard hook for `phase` that traces `label` and then panics.
pub fn panicking(phase: HookPhase, trace: &Trace, label: &str) -> HookRegistration {
    let trace = trace.clone();
    let label = label.to_owned();
    let hook = HookFn::standard(move |_ctx| {
        let trace = trace.clone();
        let label = label.clone();
        Box::pin(async move {
            trace.push(label.clone());
            panic!("{label} bug");
        })
    });
    HookRegistration::new(phase, hook)
}

/// Around hook that traces `label:in`, runs the rest of the chain, then
/// traces `label:out`.
pub fn around(trace: &Trace, label: &str) -> HookRegistration {
    let trace = trace.clone();
    let label = label.to_owned();
    HookRegistration::around(move |ctx, next| {
        let trace = trace.clone();
        let label = label.clone();
        Box::pin(async move {
            trace.push(format!("{label}:in"));
            next.run(ctx).await;
            trace.push(format!("{label}:out"));
            Ok(())
        })
    })
}

/// Around hook that answers directly without calling its continuation.
pub fn short_circuit(trace: &Trace, label: &str, answer: Value) -> HookRegistration {
    let trace = trace.clone();
    let label = label.to_owned();
    HookRegistration::around(move |ctx, _next| {
        let trace = trace.clone();
        let label = label.clone();
        let answer = answer.clone();
        Box::pin(async move {
            trace.push(label);
            ctx.result = Some(answer);
            Ok(())
        })
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// MOCK SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory service that traces each method call.
pub struct MockService {
    trace: Trace,
    calls: AtomicUsize,
}

impl MockService {
    pub fn new(trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            trace: trace.clone(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, method: &str) -> usize {
        self.trace.push(format!("service:{method}"));
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Service for MockService {
    fn find(&self, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            self.record("find");
            Ok(json!([{"id": 1, "text": "hello"}]))
        })
    }

    fn get(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let call = self.record("get");
            let id = id.map(|id| id.to_value()).unwrap_or(Value::Null);
            Ok(json!({"id": id, "text": "hello", "call": call}))
        })
    }

    fn create(&self, data: Option<Value>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            self.record("create");
            Ok(data.unwrap_or(Value::Null))
        })
    }

    fn patch(
        &self,
        _id: Option<Id>,
        _data: Option<Value>,
        _params: Params,
    ) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            self.record("patch");
            panic!("patch is broken");
        })
    }

    fn remove(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            self.record("remove");
            let id = id.map(|id| id.to_string()).unwrap_or_default();
            Err(ServiceError::not_found(format!("no record with id '{id}'")))
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAYERS
// ═══════════════════════════════════════════════════════════════════════════════

/// The three registries of one test setup.
#[derive(Default)]
pub struct Layers {
    pub global: HookRegistry,
    pub interceptors: HookRegistry,
    pub service: HookRegistry,
}

impl Layers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, ctx: HookContext) -> HookContext {
        Dispatcher::new()
            .run_registries(&self.global, &self.interceptors, Some(&self.service), ctx)
            .await
    }
}

/// A context targeting `service` at path `messages`.
pub fn call(service: &Arc<MockService>, method: &str) -> HookContext {
    let service: Arc<dyn Service> = service.clone();
    HookContext::detached("messages", method).with_service(service)
}
