//! Error taxonomy shared by the queue and its stores.

use thiserror::Error;

use crate::JobStatus;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the dispatch queue and the job state machine.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The identity is not live in the targeted queue collection(s).
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The worker descriptor is missing `perform` or declares no concurrency.
    #[error("Invalid worker configuration: {0}")]
    InvalidWorkerConfiguration(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced by a [`JobStore`](crate::JobStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store not initialized - call initialize first")]
    NotInitialized,

    #[error("Store returned a record without an identity")]
    MissingIdentity,

    #[error("Invalid store config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}
