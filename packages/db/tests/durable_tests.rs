#![cfg(feature = "surrealkv")]
#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use db::{DbConfig, Store, StoreConfig, SurrealStore};
use queue_core::{JobId, JobStatus, JobStore};

use common::{concurrent_writers, job};

#[tokio::test]
async fn incomplete_jobs_survive_restart() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("jobs").join("store");

    let (running, last_id) = {
        let store = SurrealStore::new(DbConfig::file(&path));
        store.setup().await?;

        let a = store.insert(job("mailer", 1)).await?;
        let b = store.insert(job("mailer", 2)).await?;
        let c = store.insert(job("mailer", 3)).await?;

        let a = store.update(a.with_status(JobStatus::Started)).await?;
        let b = store.update(b.with_status(JobStatus::Started)).await?;
        store.update(c.clone().with_status(JobStatus::Completed)).await?;

        (vec![a.id, b.id], c.id)
    };

    // Give the embedded engine time to release the files of the dropped handle.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let reopened = SurrealStore::new(DbConfig::file(&path));
    reopened.initialize().await?;
    reopened.initialize().await?;

    let incomplete = reopened.find_incomplete().await?;
    assert_eq!(incomplete.iter().map(|j| j.id).collect::<Vec<_>>(), running);
    assert!(incomplete.iter().all(|j| j.status == JobStatus::Started));
    assert!(incomplete.iter().all(|j| j.exec_ref.is_none()));

    assert_eq!(reopened.find_all().await?.len(), 3);
    assert_eq!(reopened.find_completed().await?.len(), 1);

    let fresh = reopened.insert(job("mailer", 4)).await?;
    assert!(fresh.id > last_id, "identities continue after a restart");
    Ok(())
}

#[tokio::test]
async fn durable_store_from_config() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let store = Store::from_config(StoreConfig::durable(dir.path().join("store")));
    assert!(store.is_durable());

    store.setup().await?;
    store.setup().await?;

    let stored = store.insert(job("mailer", 1)).await?;
    assert_eq!(stored.id, Some(JobId(1)));
    assert_eq!(store.find_for_worker("mailer").await?.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn on_disk_store_serializes_concurrent_writers() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let store = SurrealStore::new(DbConfig::file(dir.path().join("store")));
    store.setup().await?;

    concurrent_writers(Arc::new(store)).await
}
