//! Queue coordinator actor owning one worker type's dispatch queue.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use queue_core::{
    DispatchQueue, ExecRef, FindKey, JobEvent, JobId, JobRecord, JobStore, PerformResult,
    QueueError, QueueStats, StoreError, Worker,
};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::execution::{panic_message, spawn_execution};
use crate::messages::CoordinatorMessage;

/// Startup arguments for a coordinator.
pub struct CoordinatorArgs<S> {
    pub worker: Arc<Worker>,
    pub store: Arc<S>,
    pub event_tx: broadcast::Sender<JobEvent>,
}

/// State for the coordinator actor.
pub struct CoordinatorState<S> {
    queue: DispatchQueue,
    store: Arc<S>,
    completed: u64,
    failed: u64,
    event_tx: broadcast::Sender<JobEvent>,
}

impl<S: JobStore> CoordinatorState<S> {
    fn new(args: CoordinatorArgs<S>) -> Self {
        Self {
            queue: DispatchQueue::new(args.worker),
            store: args.store,
            completed: 0,
            failed: 0,
            event_tx: args.event_tx,
        }
    }

    fn worker_name(&self) -> &str {
        self.queue.worker().name()
    }

    /// Broadcast an event. Having no subscribers is fine.
    fn broadcast(&self, event: JobEvent) {
        let _ = self.event_tx.send(event);
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            completed: self.completed,
            failed: self.failed,
            ..self.queue.stats()
        }
    }

    async fn enqueue(&mut self, arguments: serde_json::Value) -> Result<JobRecord, QueueError> {
        let job = JobRecord::new(self.worker_name(), arguments);
        let job = self.store.insert(job).await?;

        self.queue.push(job.clone());
        tracing::debug!("Enqueued job {} for {}", job.id_string(), job.worker);

        self.broadcast(JobEvent::JobEnqueued {
            job: job.clone(),
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Requeue an incomplete job.
    ///
    /// The stored record is authoritative, since `job` may have been read
    /// before a completion landed. Jobs that are already live, terminal in
    /// the store, or gone from it are skipped with `None`.
    async fn resubmit(&mut self, job: JobRecord) -> Result<Option<JobRecord>, QueueError> {
        let job_id = job.id.ok_or(StoreError::MissingIdentity)?;
        if job.worker != self.worker_name() {
            return Err(QueueError::InvalidWorkerConfiguration(format!(
                "job {} belongs to worker '{}', not '{}'",
                job_id,
                job.worker,
                self.worker_name()
            )));
        }

        if self.queue.find(&FindKey::Id(job_id)).is_some() {
            return Ok(None);
        }

        let Some(mut stored) = self.store.find(job_id).await? else {
            tracing::debug!("Job {} is no longer stored, not requeueing", job_id);
            return Ok(None);
        };
        if stored.status.is_terminal() {
            tracing::debug!("Job {} is already {}, not requeueing", job_id, stored.status);
            return Ok(None);
        }

        stored.reset_for_recovery()?;
        let job = self.store.update(stored).await?;
        self.queue.push(job.clone());

        self.broadcast(JobEvent::JobRecovered {
            job_id,
            worker: job.worker.clone(),
            timestamp: Utc::now(),
        });
        Ok(Some(job))
    }

    /// Start queued jobs until the cap is reached or the queue is empty.
    async fn dispatch(&mut self, myself: &ActorRef<CoordinatorMessage>) {
        loop {
            let job = match self.queue.process(self.store.as_ref()).await {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to dispatch job for {}: {}", self.worker_name(), e);
                    break;
                }
            };

            let (Some(job_id), Some(exec_ref)) = (job.id, job.exec_ref) else {
                tracing::error!("Started job for {} has no identity", self.worker_name());
                break;
            };

            tracing::debug!("Job {} started for {} ({})", job_id, job.worker, exec_ref);
            self.broadcast(JobEvent::JobStarted {
                job_id,
                worker: job.worker.clone(),
                timestamp: Utc::now(),
            });

            spawn_execution(
                myself.clone(),
                self.queue.worker().clone(),
                exec_ref,
                job.arguments,
            );
        }
    }

    /// Record the outcome of an execution.
    ///
    /// The terminal status is persisted before the job leaves `running`; the
    /// worker's callback runs after both.
    async fn finish(&mut self, exec_ref: ExecRef, outcome: PerformResult) -> Result<(), QueueError> {
        let Some(mut job) = self.queue.find(&FindKey::Ref(exec_ref)).cloned() else {
            tracing::warn!(
                "Ignoring outcome of unknown execution {} for {}",
                exec_ref,
                self.worker_name()
            );
            return Ok(());
        };

        let started_at = job.updated_at;
        match &outcome {
            Ok(()) => job.mark_completed()?,
            Err(_) => job.mark_failed()?,
        }

        let job = self.store.update(job).await?;
        self.queue.remove(&job)?;

        let job_id = job.id.ok_or(StoreError::MissingIdentity)?;
        let now = Utc::now();

        match outcome {
            Ok(()) => {
                self.completed += 1;
                let duration_ms = started_at
                    .map(|started| (now - started).num_milliseconds().max(0) as u64)
                    .unwrap_or(0);

                tracing::debug!("Job {} completed in {}ms", job_id, duration_ms);
                let worker = self.queue.worker();
                guard_callback(job_id, || worker.notify_success(&job));

                self.broadcast(JobEvent::JobCompleted {
                    job_id,
                    worker: job.worker.clone(),
                    duration_ms,
                    timestamp: now,
                });
            }
            Err(error) => {
                self.failed += 1;

                tracing::warn!("Job {} for {} failed: {}", job_id, job.worker, error);
                let worker = self.queue.worker();
                guard_callback(job_id, || worker.notify_failure(&job, &error));

                self.broadcast(JobEvent::JobFailed {
                    job_id,
                    worker: job.worker.clone(),
                    error,
                    timestamp: now,
                });
            }
        }

        Ok(())
    }
}

/// Run a worker callback on the coordinator. A panic is logged and swallowed.
fn guard_callback(job_id: JobId, callback: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        tracing::error!(
            "Callback for job {} panicked: {}",
            job_id,
            panic_message(panic.as_ref())
        );
    }
}

/// Actor serializing every mutation of one worker type's dispatch queue.
pub struct QueueCoordinator<S>(PhantomData<fn() -> S>);

impl<S> QueueCoordinator<S> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<S> Default for QueueCoordinator<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: JobStore> Actor for QueueCoordinator<S> {
    type Msg = CoordinatorMessage;
    type State = CoordinatorState<S>;
    type Arguments = CoordinatorArgs<S>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        args.worker.validate()?;
        tracing::info!(
            "Starting queue coordinator: {} (concurrency {})",
            args.worker.name(),
            args.worker.concurrency()
        );
        Ok(CoordinatorState::new(args))
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            "Queue coordinator stopped: {} ({} queued, {} running)",
            state.worker_name(),
            state.queue.queued().len(),
            state.queue.running().len()
        );
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CoordinatorMessage::Enqueue { arguments, reply } => {
                let result = state.enqueue(arguments).await;
                if let Err(e) = &result {
                    tracing::error!("Failed to enqueue job for {}: {}", state.worker_name(), e);
                }
                let _ = reply.send(result);
                state.dispatch(&myself).await;
            }

            CoordinatorMessage::Resubmit { job, reply } => {
                let result = state.resubmit(*job).await;
                if let Err(e) = &result {
                    tracing::error!("Failed to resubmit job for {}: {}", state.worker_name(), e);
                }
                let _ = reply.send(result);
                state.dispatch(&myself).await;
            }

            CoordinatorMessage::Process => {
                state.dispatch(&myself).await;
            }

            CoordinatorMessage::JobSucceeded { exec_ref } => {
                if let Err(e) = state.finish(exec_ref, Ok(())).await {
                    tracing::error!("Failed to complete execution {}: {}", exec_ref, e);
                }
                state.dispatch(&myself).await;
            }

            CoordinatorMessage::JobFailed { exec_ref, error } => {
                if let Err(e) = state.finish(exec_ref, Err(error)).await {
                    tracing::error!("Failed to record failed execution {}: {}", exec_ref, e);
                }
                state.dispatch(&myself).await;
            }

            CoordinatorMessage::FindJob { key, reply } => {
                let _ = reply.send(state.queue.find(&key).cloned());
            }

            CoordinatorMessage::GetSnapshot { reply } => {
                let _ = reply.send(state.queue.snapshot());
            }

            CoordinatorMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }
        }

        Ok(())
    }
}
