//! Shared test utilities for `quill_app` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use std::sync::{Arc, Mutex};

use quill_app::App;
use quill_app::plugin::Plugin;
use quill_hooks::{HookFn, HookRegistration};
use quill_service::{Application, BoxFuture, HookPhase, Id, Params, Service, ServiceError, ServiceResult};
use serde_json::{Value, json};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered record of lifecycle and hook events.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// Standard hook for `phase` that logs `label`.
pub fn logged(phase: HookPhase, log: &EventLog, label: &str) -> HookRegistration {
    let log = log.clone();
    let label = label.to_owned();
    HookRegistration::new(
        phase,
        HookFn::standard(move |_ctx| {
            let log = log.clone();
            let label = label.clone();
            Box::pin(async move {
                log.push(label);
                Ok(None)
            })
        }),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimal in-memory record store keyed by numeric id.
pub struct MemoryService {
    records: Mutex<Vec<(i64, Value)>>,
    log: EventLog,
}

impl MemoryService {
    pub fn new(log: &EventLog) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            log: log.clone(),
        }
    }

    fn lookup(&self, id: Option<&Id>) -> Result<(usize, i64), ServiceError> {
        let wanted = id
            .and_then(Id::as_num)
            .ok_or_else(|| ServiceError::bad_request("numeric id required"))?;
        self.records
            .lock()
            .unwrap()
            .iter()
            .position(|(id, _)| *id == wanted)
            .map(|index| (index, wanted))
            .ok_or_else(|| ServiceError::not_found(format!("no record with id {wanted}")))
    }
}

impl Service for MemoryService {
    fn find(&self, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let records = self.records.lock().unwrap();
            Ok(Value::Array(records.iter().map(|(_, v)| v.clone()).collect()))
        })
    }

    fn get(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let (index, _) = self.lookup(id.as_ref())?;
            Ok(self.records.lock().unwrap()[index].1.clone())
        })
    }

    fn create(&self, data: Option<Value>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            let id = i64::try_from(records.len()).unwrap_or(i64::MAX) + 1;
            let mut record = data.unwrap_or_else(|| json!({}));
            if let Some(fields) = record.as_object_mut() {
                fields.insert("id".into(), json!(id));
            }
            records.push((id, record.clone()));
            Ok(record)
        })
    }

    fn remove(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let (index, _) = self.lookup(id.as_ref())?;
            Ok(self.records.lock().unwrap().remove(index).1)
        })
    }

    fn setup<'a>(
        &'a self,
        _app: &'a dyn Application,
        path: &'a str,
    ) -> BoxFuture<'a, Result<(), ServiceError>> {
        Box::pin(async move {
            self.log.push(format!("setup:{path}"));
            Ok(())
        })
    }

    fn teardown<'a>(
        &'a self,
        _app: &'a dyn Application,
        path: &'a str,
    ) -> BoxFuture<'a, Result<(), ServiceError>> {
        Box::pin(async move {
            self.log.push(format!("teardown:{path}"));
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGINS
// ═══════════════════════════════════════════════════════════════════════════════

/// Plugin that logs each lifecycle step under its label.
pub struct LifecyclePlugin {
    pub label: &'static str,
    pub log: EventLog,
}

impl Plugin for LifecyclePlugin {
    fn build(&self, _app: &App) {
        self.log.push(format!("build:{}", self.label));
    }

    fn ready(&self, _app: &App) {
        self.log.push(format!("ready:{}", self.label));
    }

    fn cleanup(&self, _app: &App) {
        self.log.push(format!("cleanup:{}", self.label));
    }

    fn is_unique(&self) -> bool {
        false
    }
}
