//! Example message service CLI.
//!
//! Runs a short scripted session against the in-memory `messages` service
//! and logs every call, its timing and its outcome.
//!
//! # Usage
//!
//! ```bash
//! QUILL_LOG=debug messages
//! ```
//!
//! `QUILL_LOG` takes `tracing` filter directives; a `.env` file is read if
//! present.

use example::{MESSAGES, build_app};
use quill_app::{App, AppError, CallArgs};
use quill_core_plugins::{TimingPlugin, TracingFormat, TracingPlugin};
use quill_service::{Params, ServiceError};
use serde_json::json;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let mut logging = TracingPlugin::new().with_format(TracingFormat::Compact);
    if let Ok(filter) = std::env::var("QUILL_LOG") {
        logging = logging.with_env_filter(filter);
    }
    let timing = TimingPlugin::new();
    let timings = timing.log();

    if let Err(err) = run(logging, timing).await {
        tracing::error!(error = %err, "example failed");
        std::process::exit(1);
    }

    for record in timings.records() {
        tracing::info!(
            path = %record.path,
            method = %record.method,
            elapsed = ?record.elapsed,
            failed = record.failed,
            "timing"
        );
    }
}

async fn run(logging: TracingPlugin, timing: TimingPlugin) -> Result<(), AppError> {
    let app = build_app(logging, timing)?;
    app.setup().await?;

    session(&app).await;

    app.teardown().await
}

async fn session(app: &App) {
    let messages = app.service(MESSAGES);
    let ann = Params::new().with("user", "ann");

    report("create", messages.create(json!({"text": "hello"}), ann.clone()).await);
    report("create", messages.create(json!({"text": "anyone here?"}), ann.clone()).await);
    report("create (anonymous)", messages.create(json!({"text": "hi"}), Params::new()).await);
    report("create (blank)", messages.create(json!({"text": " "}), ann.clone()).await);
    report("patch", messages.patch(1, json!({"text": "hello, world"}), ann.clone()).await);
    report("find", messages.find(Params::new()).await);
    report("remove", messages.remove(2, ann.clone()).await);
    report("remove (missing)", messages.remove(2, ann).await);
    report("count", messages.custom("count", CallArgs::new()).await);
    report("get (unmounted)", app.service("users").get(1, Params::new()).await);
}

fn report(label: &str, outcome: Result<serde_json::Value, ServiceError>) {
    match outcome {
        Ok(value) => tracing::info!(%value, "{label}"),
        Err(err) => tracing::info!(
            error = err.name(),
            status = err.status_code(),
            message = %err,
            "{label}"
        ),
    }
}
