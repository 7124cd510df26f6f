#![allow(dead_code)]

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;

use db::{DbConfig, SurrealStore};
use queue_core::{JobId, JobRecord, JobStatus, JobStore, StoreError};
use serde_json::json;
use tokio::task::JoinSet;

/// A SurrealDB store on a fresh in-memory engine.
pub async fn surreal_memory() -> Result<SurrealStore, StoreError> {
    let store = SurrealStore::new(DbConfig::memory());
    store.initialize().await?;
    Ok(store)
}

pub fn job(worker: &str, n: u64) -> JobRecord {
    JobRecord::new(worker, json!({ "n": n }))
}

/// Insert 64 jobs across four worker types from concurrent tasks, then move
/// each one to `started` concurrently. Every write must succeed and every
/// identity must be distinct.
pub async fn concurrent_writers<S: JobStore>(store: Arc<S>) -> Result<(), Box<dyn Error>> {
    const JOBS: u64 = 64;
    let workers = ["mailer", "thumbnails", "reports", "exports"];

    let mut inserts = JoinSet::new();
    for n in 0..JOBS {
        let store = store.clone();
        let worker = workers[(n % 4) as usize];
        inserts.spawn(async move { store.insert(job(worker, n)).await });
    }

    let mut stored = Vec::new();
    while let Some(result) = inserts.join_next().await {
        stored.push(result??);
    }

    let ids: BTreeSet<JobId> = stored.iter().filter_map(|j| j.id).collect();
    assert_eq!(ids.len() as u64, JOBS, "identities must be distinct");
    assert_eq!(ids, (1..=JOBS).map(JobId).collect::<BTreeSet<_>>());

    let mut updates = JoinSet::new();
    for record in stored {
        let store = store.clone();
        updates.spawn(async move { store.update(record.with_status(JobStatus::Started)).await });
    }
    while let Some(result) = updates.join_next().await {
        assert_eq!(result??.status, JobStatus::Started);
    }

    assert_eq!(store.find_all().await?.len() as u64, JOBS);
    for worker in workers {
        assert_eq!(store.find_for_worker(worker).await?.len() as u64, JOBS / 4);
    }
    assert_eq!(store.find_incomplete().await?.len() as u64, JOBS);

    let next = store.insert(job("mailer", JOBS)).await?;
    assert_eq!(next.id, Some(JobId(JOBS + 1)));
    Ok(())
}
