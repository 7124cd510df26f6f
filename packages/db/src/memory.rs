//! Volatile in-process job store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use queue_core::{JobId, JobRecord, JobStatus, JobStore, StoreResult};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryInner {
    jobs: BTreeMap<JobId, JobRecord>,
    last_id: u64,
}

impl MemoryInner {
    fn select(&self, keep: impl Fn(&JobRecord) -> bool) -> Vec<JobRecord> {
        self.jobs.values().filter(|job| keep(job)).cloned().collect()
    }
}

/// Job store keeping records in memory.
///
/// Cloning shares the same records. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }
}

impl JobStore for MemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.inner.read().await.select(|_| true))
    }

    async fn find_completed(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .select(|job| job.status == JobStatus::Completed))
    }

    async fn find_incomplete(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .select(|job| job.status.is_incomplete()))
    }

    async fn find_failed(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .select(|job| job.status == JobStatus::Failed))
    }

    async fn find_for_worker(&self, worker: &str) -> StoreResult<Vec<JobRecord>> {
        Ok(self.inner.read().await.select(|job| job.worker == worker))
    }

    async fn find(&self, id: JobId) -> StoreResult<Option<JobRecord>> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn insert(&self, mut record: JobRecord) -> StoreResult<JobRecord> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = JobId(inner.last_id);

        let now = Utc::now();
        record.id = Some(id);
        record.exec_ref = None;
        record.created_at = Some(now);
        record.updated_at = Some(now);

        inner.jobs.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, mut record: JobRecord) -> StoreResult<JobRecord> {
        let Some(id) = record.id else {
            return self.insert(record).await;
        };

        let mut inner = self.inner.write().await;
        inner.last_id = inner.last_id.max(id.as_u64());

        let now = Utc::now();
        record.exec_ref = None;
        record.created_at = Some(record.created_at.unwrap_or(now).min(now));
        record.updated_at = Some(now);

        inner.jobs.insert(id, record.clone());
        Ok(record)
    }

    async fn destroy(&self, id: JobId) -> StoreResult<()> {
        self.inner.write().await.jobs.remove(&id);
        Ok(())
    }
}
