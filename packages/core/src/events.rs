//! Lifecycle events broadcast by queue coordinators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, JobRecord};

/// Events emitted as jobs move through their lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// A new job was persisted and queued.
    JobEnqueued { job: JobRecord, timestamp: DateTime<Utc> },
    /// A job was dispatched to an execution slot.
    JobStarted {
        job_id: JobId,
        worker: String,
        timestamp: DateTime<Utc>,
    },
    /// A job completed successfully.
    JobCompleted {
        job_id: JobId,
        worker: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A job failed.
    JobFailed {
        job_id: JobId,
        worker: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// An incomplete job from a previous run was queued again.
    JobRecovered {
        job_id: JobId,
        worker: String,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            JobEvent::JobEnqueued { timestamp, .. } => *timestamp,
            JobEvent::JobStarted { timestamp, .. } => *timestamp,
            JobEvent::JobCompleted { timestamp, .. } => *timestamp,
            JobEvent::JobFailed { timestamp, .. } => *timestamp,
            JobEvent::JobRecovered { timestamp, .. } => *timestamp,
        }
    }

    /// Get the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            JobEvent::JobEnqueued { job, .. } => job.id,
            JobEvent::JobStarted { job_id, .. } => Some(*job_id),
            JobEvent::JobCompleted { job_id, .. } => Some(*job_id),
            JobEvent::JobFailed { job_id, .. } => Some(*job_id),
            JobEvent::JobRecovered { job_id, .. } => Some(*job_id),
        }
    }

    /// Get the worker type this event belongs to.
    pub fn worker(&self) -> &str {
        match self {
            JobEvent::JobEnqueued { job, .. } => &job.worker,
            JobEvent::JobStarted { worker, .. } => worker,
            JobEvent::JobCompleted { worker, .. } => worker,
            JobEvent::JobFailed { worker, .. } => worker,
            JobEvent::JobRecovered { worker, .. } => worker,
        }
    }

    /// Whether the event marks a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::JobCompleted { .. } | JobEvent::JobFailed { .. }
        )
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            JobEvent::JobEnqueued { job, .. } => {
                format!("Job {} enqueued for {}", job.id_string(), job.worker)
            }
            JobEvent::JobStarted { job_id, worker, .. } => {
                format!("Job {} started by {}", job_id, worker)
            }
            JobEvent::JobCompleted {
                job_id,
                duration_ms,
                ..
            } => format!("Job {} completed in {}ms", job_id, duration_ms),
            JobEvent::JobFailed { job_id, error, .. } => {
                format!("Job {} failed: {}", job_id, error)
            }
            JobEvent::JobRecovered { job_id, worker, .. } => {
                format!("Job {} recovered for {}", job_id, worker)
            }
        }
    }
}
