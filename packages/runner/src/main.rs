//! Job engine process with a handful of demo workers.
//!
//! The backend is chosen by `JOB_STORE` (`memory` or `durable`) and
//! `JOB_STORE_PATH`. With a durable store, jobs left incomplete by a previous
//! run are picked up again at startup.

use std::error::Error;
use std::time::Duration;

use actors::{Engine, EngineError};
use db::{Store, StoreConfig};
use queue_core::{JobEvent, JobStore, Worker};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let store = Store::from_config(StoreConfig::from_env()?);
    let durable = store.is_durable();
    let engine = Engine::new(store);

    if durable {
        engine.setup_store().await?;
    }
    engine.initialize_store().await?;

    let mut events = start(&engine).await?;
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            log_event(&event);
        }
    });

    tracing::info!("Job engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    engine.shutdown().await;
    let incomplete = engine.store().find_incomplete().await?;
    tracing::info!("Shutdown complete ({} jobs left incomplete)", incomplete.len());
    Ok(())
}

/// Register the demo workers, recover incomplete jobs and seed an empty store.
///
/// The returned receiver is subscribed before any job moves, so it sees the
/// recovery and seeding events too.
async fn start<S: JobStore>(engine: &Engine<S>) -> Result<broadcast::Receiver<JobEvent>, EngineError> {
    for worker in demo_workers() {
        engine.register(worker).await?;
    }

    let events = engine.subscribe();

    let recovered = engine.recover().await?;
    if recovered == 0 && engine.find_all().await?.is_empty() {
        tracing::info!("Store is empty, enqueueing demo jobs...");
        engine
            .enqueue("echo", serde_json::json!({ "message": "hello" }))
            .await?;
        engine.enqueue("sleep", serde_json::json!({ "seconds": 2 })).await?;
        engine.enqueue("fail", serde_json::json!({ "fail": true })).await?;
    }

    Ok(events)
}

fn demo_workers() -> Vec<Worker> {
    vec![
        Worker::new("echo").with_perform(|arguments| async move {
            tracing::info!("Echo job: {}", arguments);
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        }),
        Worker::new("sleep")
            .with_concurrency(2)
            .with_perform(|arguments| async move {
                let seconds = arguments
                    .get("seconds")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(5);
                tracing::info!("Sleeping for {} seconds", seconds);
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                Ok(())
            }),
        Worker::new("fail")
            .with_perform(|arguments| async move {
                let should_fail = arguments
                    .get("fail")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                if should_fail {
                    Err("Intentional failure".to_string())
                } else {
                    Ok(())
                }
            })
            .on_failure(|job, error| {
                tracing::warn!("Demo job {} failed as expected: {}", job.id_string(), error);
            }),
    ]
}

fn log_event(event: &JobEvent) {
    tracing::info!("[{}] {}", event.worker(), event.description());
}
