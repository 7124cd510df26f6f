//! Job repository for CRUD operations.

use chrono::{DateTime, Utc};
use queue_core::{JobId, JobRecord, JobStatus};
use serde::Deserialize;

use crate::{Database, DbError};

/// Repository for job persistence operations against one connection.
#[derive(Clone)]
pub struct JobRepository {
    db: Database,
}

/// Internal record type for SurrealDB.
#[derive(Debug, Deserialize)]
struct StoredJob {
    job_id: u64,
    worker: String,
    #[serde(default)]
    arguments: serde_json::Value,
    status: JobStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredJob {
    fn into_record(self) -> JobRecord {
        JobRecord {
            id: Some(JobId(self.job_id)),
            worker: self.worker,
            arguments: self.arguments,
            status: self.status,
            exec_ref: None,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Write every field of `job:<$job_id>`, creating the record when absent.
const WRITE_JOB: &str = "UPSERT type::thing('job', <string> $job_id) SET \
    job_id = $job_id, worker = $worker, arguments = $arguments, status = $status, \
    created_at = $created_at, updated_at = $updated_at";

/// Read back the record written by the transaction.
const SELECT_JOB: &str = "SELECT * FROM type::thing('job', <string> $job_id)";

/// The record selected by the final statement of a write.
fn take_written(result: &mut surrealdb::Response) -> Result<Option<JobRecord>, DbError> {
    let last = result.num_statements().saturating_sub(1);
    let records: Vec<StoredJob> = result.take(last)?;
    Ok(records.into_iter().next().map(StoredJob::into_record))
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Allocate the next identity and create the job under it.
    ///
    /// Allocation and creation commit in one transaction, so a failed create
    /// never consumes an identity. The sequence only moves forward, so an
    /// identity is never handed out twice, even across restarts.
    pub async fn insert(&self, record: JobRecord) -> Result<JobRecord, DbError> {
        let now = Utc::now();

        let mut result = self
            .db
            .query("BEGIN TRANSACTION")
            .query(
                "LET $job_id = (UPSERT job_sequence:current SET last_id += 1 RETURN VALUE last_id)[0]",
            )
            .query(WRITE_JOB)
            .query("COMMIT TRANSACTION")
            .query(SELECT_JOB)
            .bind(("worker", record.worker))
            .bind(("arguments", record.arguments))
            .bind(("status", record.status))
            .bind(("created_at", now))
            .bind(("updated_at", now))
            .await?
            .check()?;

        take_written(&mut result)?.ok_or_else(|| DbError::Query("Failed to create job".into()))
    }

    /// Replace a job, creating it when absent.
    ///
    /// The sequence is moved past `id` in the same transaction, so later
    /// inserts never collide with a caller-supplied identity.
    pub async fn upsert(&self, id: JobId, record: JobRecord) -> Result<JobRecord, DbError> {
        let job_id = i64::try_from(id.as_u64())
            .map_err(|_| DbError::Query(format!("Job identity out of range: {}", id)))?;
        let now = Utc::now();
        let created_at = record.created_at.unwrap_or(now).min(now);

        let mut result = self
            .db
            .query("BEGIN TRANSACTION")
            .query("UPSERT job_sequence:current SET last_id = math::max([last_id ?? 0, $job_id])")
            .query(WRITE_JOB)
            .query("COMMIT TRANSACTION")
            .query(SELECT_JOB)
            .bind(("job_id", job_id))
            .bind(("worker", record.worker))
            .bind(("arguments", record.arguments))
            .bind(("status", record.status))
            .bind(("created_at", created_at))
            .bind(("updated_at", now))
            .await?
            .check()?;

        take_written(&mut result)?
            .ok_or_else(|| DbError::Query(format!("Failed to update job: {}", id)))
    }

    /// Get a job by ID.
    pub async fn get(&self, id: JobId) -> Result<Option<JobRecord>, DbError> {
        let record: Option<StoredJob> = self.db.select(("job", id.to_string())).await?;

        Ok(record.map(StoredJob::into_record))
    }

    /// List every job.
    pub async fn list(&self) -> Result<Vec<JobRecord>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM job ORDER BY job_id ASC")
            .await?;

        let records: Vec<StoredJob> = result.take(0)?;

        Ok(records.into_iter().map(StoredJob::into_record).collect())
    }

    /// List jobs whose status is one of `statuses`.
    pub async fn list_by_status(
        &self,
        statuses: &[JobStatus],
    ) -> Result<Vec<JobRecord>, DbError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let mut result = self
            .db
            .query("SELECT * FROM job WHERE status INSIDE $statuses ORDER BY job_id ASC")
            .bind(("statuses", statuses))
            .await?;

        let records: Vec<StoredJob> = result.take(0)?;

        Ok(records.into_iter().map(StoredJob::into_record).collect())
    }

    /// List jobs owned by a worker type.
    pub async fn list_for_worker(&self, worker: &str) -> Result<Vec<JobRecord>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM job WHERE worker = $worker ORDER BY job_id ASC")
            .bind(("worker", worker.to_string()))
            .await?;

        let records: Vec<StoredJob> = result.take(0)?;

        Ok(records.into_iter().map(StoredJob::into_record).collect())
    }

    /// Delete a job.
    pub async fn delete(&self, id: JobId) -> Result<(), DbError> {
        let _: Option<StoredJob> = self.db.delete(("job", id.to_string())).await?;

        Ok(())
    }
}
