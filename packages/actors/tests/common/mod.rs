#![allow(dead_code)]

use std::error::Error;
use std::time::Duration;

use db::MemoryStore;
use queue_core::{JobEvent, JobId, JobRecord, JobStore, StoreError, StoreResult};
use tokio::sync::broadcast;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Receive events until `count` of them are terminal, returning the terminal ones.
pub async fn wait_for_terminal(
    events: &mut broadcast::Receiver<JobEvent>,
    count: usize,
) -> Result<Vec<JobEvent>, Box<dyn Error>> {
    let mut terminal = Vec::with_capacity(count);
    while terminal.len() < count {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.recv()).await??;
        if event.is_terminal() {
            terminal.push(event);
        }
    }
    Ok(terminal)
}

/// Receive events until one matches `predicate`.
pub async fn wait_for<F>(
    events: &mut broadcast::Receiver<JobEvent>,
    predicate: F,
) -> Result<JobEvent, Box<dyn Error>>
where
    F: Fn(&JobEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.recv()).await??;
        if predicate(&event) {
            return Ok(event);
        }
    }
}

/// Memory store that refuses every update of one job.
pub struct RefusingStore {
    pub inner: MemoryStore,
    pub refused: JobId,
}

impl JobStore for RefusingStore {
    async fn find_all(&self) -> StoreResult<Vec<JobRecord>> {
        self.inner.find_all().await
    }

    async fn find_completed(&self) -> StoreResult<Vec<JobRecord>> {
        self.inner.find_completed().await
    }

    async fn find_incomplete(&self) -> StoreResult<Vec<JobRecord>> {
        self.inner.find_incomplete().await
    }

    async fn find_failed(&self) -> StoreResult<Vec<JobRecord>> {
        self.inner.find_failed().await
    }

    async fn find_for_worker(&self, worker: &str) -> StoreResult<Vec<JobRecord>> {
        self.inner.find_for_worker(worker).await
    }

    async fn find(&self, id: JobId) -> StoreResult<Option<JobRecord>> {
        self.inner.find(id).await
    }

    async fn insert(&self, record: JobRecord) -> StoreResult<JobRecord> {
        self.inner.insert(record).await
    }

    async fn update(&self, record: JobRecord) -> StoreResult<JobRecord> {
        if record.id == Some(self.refused) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.update(record).await
    }

    async fn destroy(&self, id: JobId) -> StoreResult<()> {
        self.inner.destroy(id).await
    }
}
