//! The job engine: one coordinator per registered worker over a shared store.

use std::sync::Arc;
use std::time::Duration;

use queue_core::{
    FindKey, JobEvent, JobId, JobRecord, JobStore, QueueSnapshot, QueueStats, StoreError, Worker,
};
use ractor::{Actor, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;

use crate::coordinator::{CoordinatorArgs, QueueCoordinator};
use crate::error::{EngineError, EngineResult};
use crate::messages::CoordinatorMessage;
use crate::registry::CoordinatorRegistry;

const EVENT_CAPACITY: usize = 1024;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background job engine.
///
/// Jobs are persisted through the store before they are queued, and every
/// status transition is written back before the in-memory queue changes.
/// Each registered worker gets its own [`QueueCoordinator`], which bounds the
/// number of concurrently running jobs by the worker's concurrency.
///
/// ```ignore
/// let engine = Engine::new(MemoryStore::new());
/// engine.initialize_store().await?;
/// engine
///     .register(Worker::new("email").with_perform(|args| async move { send(args).await }))
///     .await?;
/// let id = engine.enqueue("email", json!({ "to": "ops@example.com" })).await?;
/// ```
pub struct Engine<S: JobStore> {
    store: Arc<S>,
    registry: CoordinatorRegistry,
    event_tx: broadcast::Sender<JobEvent>,
}

impl<S: JobStore> Engine<S> {
    pub fn new(store: S) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(store),
            registry: CoordinatorRegistry::new(),
            event_tx,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &CoordinatorRegistry {
        &self.registry
    }

    /// Subscribe to job lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// One-time provisioning of the store's backing resources.
    pub async fn setup_store(&self) -> EngineResult<()> {
        self.store.setup().await?;
        Ok(())
    }

    /// Prepare the store for use. Called once at startup.
    pub async fn initialize_store(&self) -> EngineResult<()> {
        self.store.initialize().await?;
        Ok(())
    }

    /// Register a worker and start its coordinator.
    pub async fn register(&self, worker: Worker) -> EngineResult<()> {
        worker.validate()?;

        let name = worker.name().to_string();
        if self.registry.contains(&name) {
            return Err(EngineError::WorkerAlreadyRegistered(name));
        }

        let args = CoordinatorArgs {
            worker: Arc::new(worker),
            store: self.store.clone(),
            event_tx: self.event_tx.clone(),
        };

        let (coordinator, _handle) = Actor::spawn(None, QueueCoordinator::<S>::new(), args)
            .await
            .map_err(|e| EngineError::Actor(format!("Failed to spawn coordinator for {}: {}", name, e)))?;

        if let Err(e) = self.registry.register(&name, coordinator.clone()) {
            coordinator.stop(None);
            return Err(e);
        }

        tracing::info!("Registered worker: {}", name);
        Ok(())
    }

    /// Names of all registered workers.
    pub fn workers(&self) -> Vec<String> {
        self.registry.list_workers()
    }

    /// Persist a new job for `worker` and queue it for dispatch.
    pub async fn enqueue(&self, worker: &str, arguments: serde_json::Value) -> EngineResult<JobId> {
        let coordinator = self.coordinator(worker)?;
        let job = ask(&coordinator, |reply| CoordinatorMessage::Enqueue { arguments, reply }).await??;
        Ok(job.id.ok_or(StoreError::MissingIdentity)?)
    }

    /// Ask `worker`'s coordinator to start whatever its free slots allow.
    pub fn process(&self, worker: &str) -> EngineResult<()> {
        self.coordinator(worker)?
            .send_message(CoordinatorMessage::Process)
            .map_err(|e| EngineError::Actor(format!("Failed to send message: {}", e)))
    }

    pub async fn find_all(&self) -> EngineResult<Vec<JobRecord>> {
        Ok(self.store.find_all().await?)
    }

    pub async fn find_completed(&self) -> EngineResult<Vec<JobRecord>> {
        Ok(self.store.find_completed().await?)
    }

    pub async fn find_incomplete(&self) -> EngineResult<Vec<JobRecord>> {
        Ok(self.store.find_incomplete().await?)
    }

    pub async fn find_failed(&self) -> EngineResult<Vec<JobRecord>> {
        Ok(self.store.find_failed().await?)
    }

    pub async fn find_for_worker(&self, worker: &str) -> EngineResult<Vec<JobRecord>> {
        Ok(self.store.find_for_worker(worker).await?)
    }

    pub async fn find(&self, id: JobId) -> EngineResult<Option<JobRecord>> {
        Ok(self.store.find(id).await?)
    }

    /// Look up a job in `worker`'s live queue rather than the store.
    pub async fn find_live(&self, worker: &str, key: FindKey) -> EngineResult<Option<JobRecord>> {
        let coordinator = self.coordinator(worker)?;
        ask(&coordinator, |reply| CoordinatorMessage::FindJob { key, reply }).await
    }

    pub async fn snapshot(&self, worker: &str) -> EngineResult<QueueSnapshot> {
        let coordinator = self.coordinator(worker)?;
        ask(&coordinator, |reply| CoordinatorMessage::GetSnapshot { reply }).await
    }

    pub async fn stats(&self, worker: &str) -> EngineResult<QueueStats> {
        let coordinator = self.coordinator(worker)?;
        ask(&coordinator, |reply| CoordinatorMessage::GetStats { reply }).await
    }

    /// Requeue every incomplete job whose worker is registered.
    ///
    /// Jobs left `started` by a previous run go back to `queued`. Jobs for
    /// unknown workers stay in the store untouched, and a job that fails to
    /// requeue is logged without stopping the others. Returns the number of
    /// jobs requeued; jobs already live or finished meanwhile are not counted.
    pub async fn recover(&self) -> EngineResult<usize> {
        let incomplete = self.store.find_incomplete().await?;
        let mut recovered = 0;

        for job in incomplete {
            let Some(coordinator) = self.registry.get(&job.worker) else {
                tracing::warn!(
                    "No worker registered for job {} ({}), leaving it in the store",
                    job.id_string(),
                    job.worker
                );
                continue;
            };

            let job_id = job.id_string();
            let result = ask(&coordinator, |reply| CoordinatorMessage::Resubmit {
                job: Box::new(job),
                reply,
            })
            .await
            .and_then(|result| result.map_err(EngineError::from));

            match result {
                Ok(Some(_)) => recovered += 1,
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to recover job {}: {}", job_id, e),
            }
        }

        tracing::info!("Recovered {} incomplete jobs", recovered);
        Ok(recovered)
    }

    /// Stop every coordinator. Running executions are abandoned and their
    /// jobs stay `started` in the store until the next recovery.
    pub async fn shutdown(&self) {
        for (worker, coordinator) in self.registry.drain() {
            tracing::info!("Stopping coordinator: {}", worker);
            if let Err(e) = coordinator.stop_and_wait(None, Some(SHUTDOWN_TIMEOUT)).await {
                tracing::warn!("Coordinator {} did not stop cleanly: {}", worker, e);
            }
        }
    }

    fn coordinator(&self, worker: &str) -> EngineResult<ActorRef<CoordinatorMessage>> {
        self.registry
            .get(worker)
            .ok_or_else(|| EngineError::WorkerNotRegistered(worker.to_string()))
    }
}

async fn ask<T>(
    coordinator: &ActorRef<CoordinatorMessage>,
    message: impl FnOnce(RpcReplyPort<T>) -> CoordinatorMessage,
) -> EngineResult<T>
where
    T: Send + 'static,
{
    let (tx, rx) = ractor::concurrency::oneshot();
    coordinator
        .send_message(message(tx.into()))
        .map_err(|e| EngineError::Actor(format!("Failed to send message: {}", e)))?;
    rx.await
        .map_err(|_| EngineError::Actor("Coordinator dropped the reply".to_string()))
}
