//! Execution slots running a worker's `perform` outside the coordinator.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use queue_core::{ExecRef, PerformResult, Worker};
use ractor::ActorRef;
use tokio::task::JoinHandle;

use crate::messages::CoordinatorMessage;

/// Run `perform` for a started job on its own task.
///
/// The outcome is sent back to the coordinator keyed by `exec_ref`. The
/// coordinator never waits on the task.
pub(crate) fn spawn_execution(
    coordinator: ActorRef<CoordinatorMessage>,
    worker: Arc<Worker>,
    exec_ref: ExecRef,
    arguments: serde_json::Value,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let message = match run_perform(&worker, arguments).await {
            Ok(()) => CoordinatorMessage::JobSucceeded { exec_ref },
            Err(error) => CoordinatorMessage::JobFailed { exec_ref, error },
        };

        if let Err(e) = coordinator.send_message(message) {
            tracing::warn!(
                "Coordinator for {} stopped before execution {} reported: {}",
                worker.name(),
                exec_ref,
                e
            );
        }
    })
}

/// Panics inside `perform` become failures.
async fn run_perform(worker: &Worker, arguments: serde_json::Value) -> PerformResult {
    let perform = worker.perform(arguments).map_err(|e| e.to_string())?;

    match AssertUnwindSafe(perform).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(format!("perform panicked: {}", panic_message(panic.as_ref()))),
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
