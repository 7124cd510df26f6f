//! Message types for actor communication.

use queue_core::{ExecRef, FindKey, JobRecord, QueueError, QueueSnapshot, QueueStats};
use ractor::RpcReplyPort;

/// Messages for a QueueCoordinator.
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// Persist and queue a new job.
    Enqueue {
        arguments: serde_json::Value,
        reply: RpcReplyPort<Result<JobRecord, QueueError>>,
    },

    /// Queue a job recovered from the store. Replies `None` when the job
    /// needed no requeue.
    Resubmit {
        job: Box<JobRecord>,
        reply: RpcReplyPort<Result<Option<JobRecord>, QueueError>>,
    },

    /// Start as many queued jobs as the concurrency cap allows.
    Process,

    /// An execution slot finished `perform` successfully.
    JobSucceeded { exec_ref: ExecRef },

    /// An execution slot reported an error from `perform`.
    JobFailed { exec_ref: ExecRef, error: String },

    /// Look up a live job in the dispatch queue.
    FindJob {
        key: FindKey,
        reply: RpcReplyPort<Option<JobRecord>>,
    },

    /// Get a copy of the queued and running collections.
    GetSnapshot { reply: RpcReplyPort<QueueSnapshot> },

    /// Get queue stats.
    GetStats { reply: RpcReplyPort<QueueStats> },
}
