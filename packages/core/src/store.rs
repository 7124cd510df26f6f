//! Persistence contract every storage backend satisfies.

use std::future::Future;

use crate::{JobId, JobRecord, StoreResult};

/// Storage backend for job records.
///
/// Each call is atomic: it either fully applies or has no effect. Queries
/// return records in ascending identity order, which is insertion order since
/// identities are assigned monotonically.
pub trait JobStore: Send + Sync + 'static {
    /// One-time provisioning of backing storage. Safe to repeat.
    fn setup(&self) -> impl Future<Output = StoreResult<()>> + Send {
        self.initialize()
    }

    /// Open or create storage on process start. Safe to repeat.
    ///
    /// After it returns, [`JobStore::find_incomplete`] sees every record that
    /// was queued or started before the last shutdown.
    fn initialize(&self) -> impl Future<Output = StoreResult<()>> + Send {
        async { Ok(()) }
    }

    fn find_all(&self) -> impl Future<Output = StoreResult<Vec<JobRecord>>> + Send;

    fn find_completed(&self) -> impl Future<Output = StoreResult<Vec<JobRecord>>> + Send;

    /// Records whose status is `queued` or `started`.
    fn find_incomplete(&self) -> impl Future<Output = StoreResult<Vec<JobRecord>>> + Send;

    fn find_failed(&self) -> impl Future<Output = StoreResult<Vec<JobRecord>>> + Send;

    fn find_for_worker(
        &self,
        worker: &str,
    ) -> impl Future<Output = StoreResult<Vec<JobRecord>>> + Send;

    /// Point lookup. A missing record is `Ok(None)`, never an error.
    fn find(&self, id: JobId) -> impl Future<Output = StoreResult<Option<JobRecord>>> + Send;

    /// Assign a fresh identity and both timestamps, then persist.
    fn insert(&self, record: JobRecord) -> impl Future<Output = StoreResult<JobRecord>> + Send;

    /// Persist the full record keyed by its identity, refreshing `updated_at`.
    ///
    /// Upserts: an unknown identity is stored as a new record, and a record
    /// without identity is inserted.
    fn update(&self, record: JobRecord) -> impl Future<Output = StoreResult<JobRecord>> + Send;

    /// Delete by identity. Deleting a missing record is not an error.
    fn destroy(&self, id: JobId) -> impl Future<Output = StoreResult<()>> + Send;
}
