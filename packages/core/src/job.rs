//! Job domain types and the job status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::QueueError;

/// Store-assigned identity of a job.
///
/// Identities are handed out monotonically by the store on first persist and
/// are never reused, even across restarts of a durable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.parse()?))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution-slot handle.
///
/// Minted when a job is dispatched and used only to route the completion or
/// failure signal of that execution back to the right record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecRef(Ulid);

impl ExecRef {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ExecRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current status of a job in its lifecycle.
///
/// `Queued -> Started -> Completed | Failed`. Terminal states have no way out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the dispatch queue.
    #[default]
    Queued,
    /// Dispatched to an execution slot.
    Started,
    /// `perform` returned successfully.
    Completed,
    /// `perform` returned an error or panicked.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Queued and started jobs are the ones recovered after a restart.
    pub fn is_incomplete(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Started)
                | (JobStatus::Started, JobStatus::Completed)
                | (JobStatus::Started, JobStatus::Failed)
        )
    }

    /// Get a simple status string for display and queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Started => "started",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persistent unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Absent until the record is first persisted.
    pub id: Option<JobId>,
    /// Worker type that owns this job.
    pub worker: String,
    /// Opaque payload handed to the worker's `perform`.
    #[serde(default)]
    pub arguments: serde_json::Value,
    pub status: JobStatus,
    /// Live execution handle, only set while started. Never persisted.
    #[serde(skip)]
    pub exec_ref: Option<ExecRef>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a new, not yet persisted, queued job.
    pub fn new(worker: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: None,
            worker: worker.into(),
            arguments,
            status: JobStatus::Queued,
            exec_ref: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the status directly, bypassing the state machine.
    ///
    /// Meant for seeding stores and tests; live transitions go through
    /// [`JobRecord::transition`].
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    /// Identity as a display string, `-` when not yet persisted.
    pub fn id_string(&self) -> String {
        self.id.map_or_else(|| "-".to_string(), |id| id.to_string())
    }

    /// Apply a state machine transition.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), QueueError> {
        if !self.status.can_transition_to(next) {
            return Err(QueueError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// `Queued -> Started`, binding the execution handle.
    pub fn mark_started(&mut self, exec_ref: ExecRef) -> Result<(), QueueError> {
        self.transition(JobStatus::Started)?;
        self.exec_ref = Some(exec_ref);
        Ok(())
    }

    /// `Started -> Completed`.
    pub fn mark_completed(&mut self) -> Result<(), QueueError> {
        self.transition(JobStatus::Completed)?;
        self.exec_ref = None;
        Ok(())
    }

    /// `Started -> Failed`.
    pub fn mark_failed(&mut self) -> Result<(), QueueError> {
        self.transition(JobStatus::Failed)?;
        self.exec_ref = None;
        Ok(())
    }

    /// Put an incomplete job back in the queued state after a restart.
    ///
    /// The execution slot of a started job did not survive the process, so the
    /// job has to run again. Terminal jobs are rejected.
    pub fn reset_for_recovery(&mut self) -> Result<(), QueueError> {
        if self.status.is_terminal() {
            return Err(QueueError::InvalidTransition {
                from: self.status,
                to: JobStatus::Queued,
            });
        }
        self.status = JobStatus::Queued;
        self.exec_ref = None;
        Ok(())
    }
}
