//! Store selection from configuration.

use std::path::PathBuf;

use queue_core::{JobId, JobRecord, JobStore, StoreResult};

use crate::{DbConfig, DbError, MemoryStore, SurrealStore};

/// Default on-disk location of the durable store.
pub const DEFAULT_STORE_PATH: &str = "./data/jobs";

/// Which backend to run with.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Volatile, in-process records.
    Memory,
    /// SurrealDB on disk.
    Durable(DbConfig),
}

impl StoreConfig {
    pub fn memory() -> Self {
        StoreConfig::Memory
    }

    pub fn durable(path: impl Into<PathBuf>) -> Self {
        StoreConfig::Durable(DbConfig::file(path))
    }

    /// Build a config from environment variables.
    ///
    /// - `JOB_STORE`: `memory` (default) or `durable`
    /// - `JOB_STORE_PATH`: on-disk location for `durable` (default: `./data/jobs`)
    pub fn from_env() -> Result<Self, DbError> {
        let backend = std::env::var("JOB_STORE").ok();
        let path = std::env::var("JOB_STORE_PATH").ok();
        Self::from_values(backend.as_deref(), path.as_deref())
    }

    fn from_values(backend: Option<&str>, path: Option<&str>) -> Result<Self, DbError> {
        match backend.map(|b| b.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("memory") => Ok(StoreConfig::Memory),
            Some("durable") => Ok(StoreConfig::durable(
                path.filter(|p| !p.trim().is_empty())
                    .unwrap_or(DEFAULT_STORE_PATH),
            )),
            Some(other) => Err(DbError::InvalidConfig(format!(
                "unknown JOB_STORE '{}', expected 'memory' or 'durable'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Durable(_) => "durable",
        }
    }
}

/// The store chosen at startup.
pub enum Store {
    Memory(MemoryStore),
    Durable(SurrealStore),
}

impl Store {
    pub fn from_config(config: StoreConfig) -> Self {
        tracing::info!("Using {} job store", config.as_str());
        match config {
            StoreConfig::Memory => Store::Memory(MemoryStore::new()),
            StoreConfig::Durable(db) => Store::Durable(SurrealStore::new(db)),
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Store::Durable(_))
    }
}

impl JobStore for Store {
    async fn setup(&self) -> StoreResult<()> {
        match self {
            Store::Memory(store) => store.setup().await,
            Store::Durable(store) => store.setup().await,
        }
    }

    async fn initialize(&self) -> StoreResult<()> {
        match self {
            Store::Memory(store) => store.initialize().await,
            Store::Durable(store) => store.initialize().await,
        }
    }

    async fn find_all(&self) -> StoreResult<Vec<JobRecord>> {
        match self {
            Store::Memory(store) => store.find_all().await,
            Store::Durable(store) => store.find_all().await,
        }
    }

    async fn find_completed(&self) -> StoreResult<Vec<JobRecord>> {
        match self {
            Store::Memory(store) => store.find_completed().await,
            Store::Durable(store) => store.find_completed().await,
        }
    }

    async fn find_incomplete(&self) -> StoreResult<Vec<JobRecord>> {
        match self {
            Store::Memory(store) => store.find_incomplete().await,
            Store::Durable(store) => store.find_incomplete().await,
        }
    }

    async fn find_failed(&self) -> StoreResult<Vec<JobRecord>> {
        match self {
            Store::Memory(store) => store.find_failed().await,
            Store::Durable(store) => store.find_failed().await,
        }
    }

    async fn find_for_worker(&self, worker: &str) -> StoreResult<Vec<JobRecord>> {
        match self {
            Store::Memory(store) => store.find_for_worker(worker).await,
            Store::Durable(store) => store.find_for_worker(worker).await,
        }
    }

    async fn find(&self, id: JobId) -> StoreResult<Option<JobRecord>> {
        match self {
            Store::Memory(store) => store.find(id).await,
            Store::Durable(store) => store.find(id).await,
        }
    }

    async fn insert(&self, record: JobRecord) -> StoreResult<JobRecord> {
        match self {
            Store::Memory(store) => store.insert(record).await,
            Store::Durable(store) => store.insert(record).await,
        }
    }

    async fn update(&self, record: JobRecord) -> StoreResult<JobRecord> {
        match self {
            Store::Memory(store) => store.update(record).await,
            Store::Durable(store) => store.update(record).await,
        }
    }

    async fn destroy(&self, id: JobId) -> StoreResult<()> {
        match self {
            Store::Memory(store) => store.destroy(id).await,
            Store::Durable(store) => store.destroy(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_memory() -> Result<(), DbError> {
        assert!(matches!(
            StoreConfig::from_values(None, None)?,
            StoreConfig::Memory
        ));
        assert!(matches!(
            StoreConfig::from_values(Some("Memory"), Some("/ignored"))?,
            StoreConfig::Memory
        ));
        Ok(())
    }

    #[test]
    fn durable_uses_path_or_default() -> Result<(), DbError> {
        let StoreConfig::Durable(db) = StoreConfig::from_values(Some("durable"), None)? else {
            panic!("expected durable config");
        };
        assert_eq!(db.data_dir(), Some(std::path::Path::new(DEFAULT_STORE_PATH)));

        let StoreConfig::Durable(db) =
            StoreConfig::from_values(Some("durable"), Some("/var/lib/jobs"))?
        else {
            panic!("expected durable config");
        };
        assert_eq!(db.endpoint, "surrealkv:///var/lib/jobs");
        Ok(())
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(matches!(
            StoreConfig::from_values(Some("redis"), None),
            Err(DbError::InvalidConfig(_))
        ));
    }
}
