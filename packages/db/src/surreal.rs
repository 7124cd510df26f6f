//! Durable job store backed by an embedded SurrealDB engine.

use queue_core::{JobId, JobRecord, JobStatus, JobStore, StoreResult};
use tokio::sync::{Mutex, OnceCell};

use crate::repositories::JobRepository;
use crate::{DbConfig, DbError, connect_db, init_schema};

/// Job store persisting records through SurrealDB.
///
/// The connection is opened lazily by [`JobStore::initialize`]; every other
/// call fails with `NotInitialized` until then.
///
/// Writes from every coordinator share the identity sequence record, so they
/// are serialized through `writes`. Reads run concurrently.
pub struct SurrealStore {
    config: DbConfig,
    repo: OnceCell<JobRepository>,
    writes: Mutex<()>,
}

impl SurrealStore {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            repo: OnceCell::new(),
            writes: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    fn repo(&self) -> Result<&JobRepository, DbError> {
        self.repo.get().ok_or(DbError::NotInitialized)
    }

    /// Create the on-disk directories, then open the database.
    pub async fn provision(&self) -> Result<(), DbError> {
        if let Some(parent) = self
            .config
            .data_dir()
            .and_then(|dir| dir.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
            tracing::info!("Provisioned job store directory {:?}", parent);
        }
        self.open().await?;
        Ok(())
    }

    /// Open the connection and apply the schema, once.
    pub async fn open(&self) -> Result<&JobRepository, DbError> {
        self.repo
            .get_or_try_init(|| async {
                let db = connect_db(&self.config).await?;
                init_schema(&db).await?;
                Ok(JobRepository::new(db))
            })
            .await
    }
}

impl JobStore for SurrealStore {
    async fn setup(&self) -> StoreResult<()> {
        Ok(self.provision().await?)
    }

    async fn initialize(&self) -> StoreResult<()> {
        self.open().await?;
        Ok(())
    }

    async fn find_all(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.repo()?.list().await?)
    }

    async fn find_completed(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.repo()?.list_by_status(&[JobStatus::Completed]).await?)
    }

    async fn find_incomplete(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .repo()?
            .list_by_status(&[JobStatus::Queued, JobStatus::Started])
            .await?)
    }

    async fn find_failed(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.repo()?.list_by_status(&[JobStatus::Failed]).await?)
    }

    async fn find_for_worker(&self, worker: &str) -> StoreResult<Vec<JobRecord>> {
        Ok(self.repo()?.list_for_worker(worker).await?)
    }

    async fn find(&self, id: JobId) -> StoreResult<Option<JobRecord>> {
        Ok(self.repo()?.get(id).await?)
    }

    async fn insert(&self, record: JobRecord) -> StoreResult<JobRecord> {
        let repo = self.repo()?;
        let _write = self.writes.lock().await;
        let stored = repo.insert(record).await?;
        tracing::debug!("Inserted job {} for {}", stored.id_string(), stored.worker);
        Ok(stored)
    }

    async fn update(&self, record: JobRecord) -> StoreResult<JobRecord> {
        let Some(id) = record.id else {
            return self.insert(record).await;
        };
        let repo = self.repo()?;
        let _write = self.writes.lock().await;
        Ok(repo.upsert(id, record).await?)
    }

    async fn destroy(&self, id: JobId) -> StoreResult<()> {
        let repo = self.repo()?;
        let _write = self.writes.lock().await;
        Ok(repo.delete(id).await?)
    }
}
