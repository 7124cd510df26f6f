//! Core domain types for the job queue system.
//!
//! This crate contains the types shared by every package:
//! - JobRecord and the JobStatus state machine
//! - Worker descriptors and the DispatchQueue scheduling structure
//! - The JobStore persistence contract and its errors
//! - Events for lifecycle updates

mod error;
mod events;
mod job;
mod queue;
mod store;
mod worker;

pub use error::{QueueError, StoreError, StoreResult};
pub use events::JobEvent;
pub use job::{ExecRef, JobId, JobRecord, JobStatus};
pub use queue::{DispatchQueue, FindKey, QueueSnapshot, QueueStats};
pub use store::JobStore;
pub use worker::{DEFAULT_CONCURRENCY, PerformFuture, PerformResult, Worker};
