//! Integration tests for the application: layering, lifecycle and plugins.

mod test_utils;

use std::sync::Arc;

use quill_app::prelude::*;
use quill_hooks::{Dispatcher, HookRegistration};
use quill_service::{ContextUpdate, HookPhase, Params, ServiceError};
use serde_json::{Value, json};
use tokio::sync::Notify;
use test_utils::{EventLog, LifecyclePlugin, MemoryService, logged};

// ─────────────────────────────────────────────────────────────────────────────
// Calls
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn handle_methods_round_trip_through_pipeline() {
    let log = EventLog::new();
    let app = App::new();
    let messages = app.mount("messages", MemoryService::new(&log)).unwrap();

    let created = messages
        .create(json!({"text": "hello"}), Params::new())
        .await
        .unwrap();
    assert_eq!(created, json!({"text": "hello", "id": 1}));

    assert_eq!(
        messages.get(1, Params::new()).await,
        Ok(json!({"text": "hello", "id": 1}))
    );
    assert_eq!(
        messages.find(Params::new()).await,
        Ok(json!([{"text": "hello", "id": 1}]))
    );
    assert_eq!(
        messages.remove(7, Params::new()).await,
        Err(ServiceError::not_found("no record with id 7"))
    );
    assert_eq!(
        messages.patch(1, json!({}), Params::new()).await,
        Err(ServiceError::method_not_found("patch"))
    );
}

#[tokio::test]
async fn layers_run_in_pipeline_order() {
    let log = EventLog::new();
    let app = App::new();
    app.mount("messages", MemoryService::new(&log)).unwrap();

    app.hooks([
        logged(HookPhase::Before, &log, "global:before"),
        logged(HookPhase::After, &log, "global:after"),
    ]);
    app.interceptors([
        logged(HookPhase::Before, &log, "interceptor:before"),
        logged(HookPhase::After, &log, "interceptor:after"),
    ]);
    app.service_hooks(
        "messages",
        [
            logged(HookPhase::Before, &log, "service:before"),
            logged(HookPhase::After, &log, "service:after"),
        ],
    )
    .unwrap();

    app.service("messages").find(Params::new()).await.unwrap();

    assert_eq!(
        log.events(),
        [
            "global:before",
            "service:before",
            "interceptor:before",
            "interceptor:after",
            "service:after",
            "global:after",
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

/// Around hook that parks calls carrying `params.park` until `release`
/// fires, after signalling `entered`.
fn parking(entered: &Arc<Notify>, release: &Arc<Notify>) -> HookRegistration {
    let entered = Arc::clone(entered);
    let release = Arc::clone(release);
    HookRegistration::around(move |ctx, next| {
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        Box::pin(async move {
            if ctx.params.get("park").is_some() {
                entered.notify_one();
                release.notified().await;
            }
            next.run(ctx).await;
            Ok(())
        })
    })
}

fn stamp_user() -> HookRegistration {
    HookRegistration::before(|ctx| {
        Box::pin(async move {
            let user = ctx
                .params
                .get("user")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            ctx.params.insert("stamp", format!("{user}:stamp"));
            Ok(None)
        })
    })
}

#[tokio::test]
async fn hooks_registered_mid_call_apply_only_to_later_calls() {
    let log = EventLog::new();
    let app = App::new();
    app.mount("messages", MemoryService::new(&log)).unwrap();

    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    app.hooks([parking(&entered, &release)]);

    let parked = CallArgs::new().with_params(Params::new().with("park", true));
    let (first, second) = tokio::join!(app.call("messages", "find", parked), async {
        entered.notified().await;
        app.hooks([logged(HookPhase::After, &log, "late:after")]);
        let second = app.call("messages", "find", CallArgs::new()).await;
        assert_eq!(log.events(), ["late:after"]);
        release.notify_one();
        second
    });

    assert!(!first.has_error());
    assert!(!second.has_error());
    assert_eq!(log.events(), ["late:after"]);

    app.service("messages").find(Params::new()).await.unwrap();
    assert_eq!(log.events(), ["late:after", "late:after"]);
}

#[tokio::test]
async fn concurrent_calls_do_not_share_context() {
    let log = EventLog::new();
    let app = App::new();
    app.mount("messages", MemoryService::new(&log)).unwrap();

    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    app.hooks([stamp_user(), parking(&entered, &release)]);

    let ann = CallArgs::new().with_params(Params::new().with("user", "ann").with("park", true));
    let bob = CallArgs::new().with_params(Params::new().with("user", "bob"));
    let (ann, bob) = tokio::join!(app.call("messages", "find", ann), async {
        entered.notified().await;
        let bob = app.call("messages", "find", bob).await;
        release.notify_one();
        bob
    });

    assert_eq!(ann.params.get("user"), Some(&json!("ann")));
    assert_eq!(ann.params.get("stamp"), Some(&json!("ann:stamp")));
    assert_eq!(bob.params.get("user"), Some(&json!("bob")));
    assert_eq!(bob.params.get("stamp"), Some(&json!("bob:stamp")));
    assert!(bob.params.get("park").is_none());
    assert_eq!(ann.result, Some(json!([])));
    assert_eq!(bob.result, Some(json!([])));
}

#[tokio::test]
async fn global_hooks_respect_path_patterns() {
    let log = EventLog::new();
    let app = App::new();
    app.mount("messages", MemoryService::new(&log)).unwrap();
    app.mount("users", MemoryService::new(&log)).unwrap();
    app.hooks([logged(HookPhase::Before, &log, "users-only").for_path("users")]);

    app.service("messages").find(Params::new()).await.unwrap();
    app.service("users").find(Params::new()).await.unwrap();

    assert_eq!(log.events(), ["users-only"]);
}

#[tokio::test]
async fn unmounted_path_runs_only_global_and_interceptor_error_hooks() {
    let log = EventLog::new();
    let app = App::new();
    app.hooks([
        logged(HookPhase::Before, &log, "global:before"),
        logged(HookPhase::Error, &log, "global:error"),
    ]);
    app.interceptors([logged(HookPhase::Error, &log, "interceptor:error")]);

    let ctx = app.call("ghosts", "find", CallArgs::new()).await;

    assert_eq!(log.events(), ["interceptor:error", "global:error"]);
    assert_eq!(ctx.phase, HookPhase::Error);
    assert_eq!(ctx.effective_status(), Some(404));
}

#[tokio::test]
async fn hooks_reach_settings_and_sibling_services() {
    let log = EventLog::new();
    let app = App::new();
    app.set("greeting", "hi");
    app.mount("messages", MemoryService::new(&log)).unwrap();
    app.mount("users", MemoryService::new(&log)).unwrap();

    app.service_hooks(
        "messages",
        [HookRegistration::before(|ctx| {
            Box::pin(async move {
                let greeting = ctx.app.setting("greeting").unwrap_or_default();
                let users = ctx.app.service("users").is_some();
                let data = json!({"text": greeting, "users_mounted": users});
                Ok(Some(ContextUpdate::new().with_data(data)))
            })
        })],
    )
    .unwrap();

    let created = app
        .service("messages")
        .create(json!({"text": "ignored"}), Params::new())
        .await
        .unwrap();

    assert_eq!(
        created,
        json!({"text": "hi", "users_mounted": true, "id": 1})
    );
}

#[tokio::test]
async fn error_hook_can_rewrite_status() {
    let log = EventLog::new();
    let app = App::new();
    app.mount("messages", MemoryService::new(&log)).unwrap();
    app.hooks([HookRegistration::error(|ctx| {
        Box::pin(async move {
            if matches!(ctx.error, Some(ServiceError::NotFound(_))) {
                ctx.status_code = Some(410);
            }
            Ok(None)
        })
    })]);

    let ctx = app
        .call("messages", "get", CallArgs::new().with_id(5))
        .await;

    assert_eq!(ctx.effective_status(), Some(410));
}

#[tokio::test]
async fn unsuppressed_dispatcher_lets_error_hook_failures_through() {
    let log = EventLog::new();
    let app = App::with_dispatcher(Dispatcher::new().with_suppress_error_hook_errors(false));
    app.mount("messages", MemoryService::new(&log)).unwrap();
    app.hooks([HookRegistration::error(|_ctx| {
        Box::pin(async { Err(ServiceError::general("reporter offline")) })
    })]);

    let err = app.service("messages").get(5, Params::new()).await;

    assert_eq!(err, Err(ServiceError::general("reporter offline")));
    assert!(!app.dispatcher().suppresses_error_hook_errors());
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn setup_and_teardown_order() {
    let log = EventLog::new();
    let app = App::new();
    app.add_plugin(LifecyclePlugin {
        label: "a",
        log: log.clone(),
    })
    .unwrap();
    app.add_plugin(LifecyclePlugin {
        label: "b",
        log: log.clone(),
    })
    .unwrap();
    app.mount("messages", MemoryService::new(&log)).unwrap();
    app.mount("users", MemoryService::new(&log)).unwrap();

    app.setup().await.unwrap();
    app.teardown().await.unwrap();

    assert_eq!(
        log.events(),
        [
            "build:a",
            "build:b",
            "ready:a",
            "ready:b",
            "setup:messages",
            "setup:users",
            "teardown:users",
            "teardown:messages",
            "cleanup:b",
            "cleanup:a",
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins
// ─────────────────────────────────────────────────────────────────────────────

struct StampPlugin;

impl Plugin for StampPlugin {
    fn build(&self, app: &App) {
        app.set("stamp", true);
        app.hooks([HookRegistration::before(|ctx| {
            Box::pin(async move {
                ctx.params.insert("stamped", true);
                Ok(None)
            })
        })]);
    }
}

struct NeedsStamp;

impl Plugin for NeedsStamp {
    fn build(&self, _app: &App) {}

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<StampPlugin>()]
    }
}

#[tokio::test]
async fn plugin_build_registers_hooks_and_settings() {
    let app = App::new();
    app.mount("messages", MemoryService::new(&EventLog::new()))
        .unwrap();
    app.add_plugin(StampPlugin).unwrap();

    let ctx = app.call("messages", "find", CallArgs::new()).await;

    assert!(app.has_plugin::<StampPlugin>());
    assert_eq!(app.get("stamp"), Some(json!(true)));
    assert_eq!(ctx.params.get("stamped"), Some(&json!(true)));
}

#[test]
fn unique_plugins_are_added_once() {
    let app = App::new();
    app.add_plugin(StampPlugin).unwrap();
    assert!(matches!(
        app.add_plugin(StampPlugin),
        Err(AppError::DuplicatePlugin(_))
    ));
}

#[test]
fn racing_unique_plugins_are_added_once() {
    let app = App::new();
    let added = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| app.add_plugin(StampPlugin).is_ok()))
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(added, 1);
    assert_eq!(app.get("stamp"), Some(json!(true)));
}

#[test]
fn dependencies_must_be_added_first() {
    let app = App::new();
    let err = app.add_plugin(NeedsStamp).unwrap_err();
    assert!(matches!(
        err,
        AppError::MissingDependency { dependency, .. } if dependency.ends_with("StampPlugin")
    ));
    assert!(!app.has_plugin::<NeedsStamp>());

    app.add_plugin(StampPlugin).unwrap();
    app.add_plugin(NeedsStamp).unwrap();
    assert!(app.has_plugin::<NeedsStamp>());
}
