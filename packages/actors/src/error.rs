//! Error type for engine operations.

use queue_core::{QueueError, StoreError};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Worker not registered: {0}")]
    WorkerNotRegistered(String),

    #[error("Worker already registered: {0}")]
    WorkerAlreadyRegistered(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
