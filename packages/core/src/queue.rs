//! Bounded-concurrency dispatch queue for a single worker type.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{ExecRef, JobId, JobRecord, JobStatus, JobStore, QueueError, Worker};

/// Lookup key for [`DispatchQueue::find`].
#[derive(Debug, Clone, PartialEq)]
pub enum FindKey {
    /// Store identity. The default key.
    Id(JobId),
    /// Execution handle. Only started jobs carry one, so only `running` is searched.
    Ref(ExecRef),
    Status(JobStatus),
    Arguments(serde_json::Value),
}

impl From<JobId> for FindKey {
    fn from(id: JobId) -> Self {
        FindKey::Id(id)
    }
}

impl FindKey {
    fn matches(&self, job: &JobRecord) -> bool {
        match self {
            FindKey::Id(id) => job.id == Some(*id),
            FindKey::Ref(exec_ref) => job.exec_ref == Some(*exec_ref),
            FindKey::Status(status) => job.status == *status,
            FindKey::Arguments(arguments) => job.arguments == *arguments,
        }
    }
}

/// Statistics for a worker type's queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueStats {
    /// Number of jobs waiting in `queued`.
    pub queued: u64,
    /// Number of jobs in `running`.
    pub running: u64,
    /// Jobs completed since the coordinator started.
    pub completed: u64,
    /// Jobs failed since the coordinator started.
    pub failed: u64,
}

impl QueueStats {
    /// Total live jobs (queued + running).
    pub fn active(&self) -> u64 {
        self.queued + self.running
    }

    /// Total processed jobs.
    pub fn processed(&self) -> u64 {
        self.completed + self.failed
    }

    /// Success rate as a percentage.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.processed();
        if total == 0 {
            None
        } else {
            Some((self.completed as f64 / total as f64) * 100.0)
        }
    }
}

/// Point-in-time copy of a dispatch queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub worker: String,
    pub concurrency: usize,
    pub queued: Vec<JobRecord>,
    pub running: Vec<JobRecord>,
}

/// Per-worker-type queue holding FIFO `queued` jobs and the `running` set.
///
/// The queue is owned by exactly one coordinator, which serializes every
/// mutation. A job lives in at most one of the two collections.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    worker: Arc<Worker>,
    queued: VecDeque<JobRecord>,
    running: Vec<JobRecord>,
}

impl DispatchQueue {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self {
            worker,
            queued: VecDeque::new(),
            running: Vec::new(),
        }
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    pub fn queued(&self) -> &VecDeque<JobRecord> {
        &self.queued
    }

    pub fn running(&self) -> &[JobRecord] {
        &self.running
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.running.is_empty()
    }

    /// Whether another job may start under the concurrency cap.
    pub fn has_capacity(&self) -> bool {
        self.running.len() < self.worker.concurrency()
    }

    /// Append a job to the tail of `queued`.
    pub fn push(&mut self, job: JobRecord) {
        self.queued.push_back(job);
    }

    /// Append jobs to the tail of `queued`, preserving their order.
    pub fn push_all(&mut self, jobs: impl IntoIterator<Item = JobRecord>) {
        self.queued.extend(jobs);
    }

    /// Remove and return the head of `queued`. Never touches `running`.
    pub fn pop(&mut self) -> Option<JobRecord> {
        self.queued.pop_front()
    }

    /// Dispatch step.
    ///
    /// Below the cap, the head of `queued` is marked started, persisted, and
    /// moved to `running`; the started record is returned. At the cap or with
    /// an empty queue nothing changes and `None` is returned. The transition is
    /// persisted before the queue is mutated, so a failed write leaves the
    /// queue untouched.
    pub async fn process<S: JobStore>(
        &mut self,
        store: &S,
    ) -> Result<Option<JobRecord>, QueueError> {
        self.worker.validate()?;

        if !self.has_capacity() {
            return Ok(None);
        }
        let Some(head) = self.queued.front() else {
            return Ok(None);
        };

        let exec_ref = ExecRef::new();
        let mut started = head.clone();
        started.mark_started(exec_ref)?;

        let mut started = store.update(started).await?;
        started.exec_ref = Some(exec_ref);

        self.queued.pop_front();
        self.running.push(started.clone());

        Ok(Some(started))
    }

    /// Find the first job matching `key`.
    ///
    /// Execution handles are only searched in `running`; other keys search
    /// `queued` first, then `running`.
    pub fn find(&self, key: &FindKey) -> Option<&JobRecord> {
        if let FindKey::Ref(_) = key {
            return self.running.iter().find(|job| key.matches(job));
        }
        self.queued
            .iter()
            .chain(self.running.iter())
            .find(|job| key.matches(job))
    }

    /// Replace the live job with the same identity, `queued` first.
    pub fn update(&mut self, job: JobRecord) -> Result<(), QueueError> {
        let id = job.id;
        let slot = self
            .queued
            .iter_mut()
            .chain(self.running.iter_mut())
            .find(|live| id.is_some() && live.id == id)
            .ok_or_else(|| QueueError::JobNotFound(job.id_string()))?;
        *slot = job;
        Ok(())
    }

    /// Delete a job from `running` by identity, freeing its slot.
    pub fn remove(&mut self, job: &JobRecord) -> Result<JobRecord, QueueError> {
        let position = self
            .running
            .iter()
            .position(|live| job.id.is_some() && live.id == job.id)
            .ok_or_else(|| QueueError::JobNotFound(job.id_string()))?;
        Ok(self.running.remove(position))
    }

    /// Counts of the live collections; completion counters are left at zero.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.queued.len() as u64,
            running: self.running.len() as u64,
            ..QueueStats::default()
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            worker: self.worker.name().to_string(),
            concurrency: self.worker.concurrency(),
            queued: self.queued.iter().cloned().collect(),
            running: self.running.clone(),
        }
    }
}
