//! Worker-type descriptors.
//!
//! A [`Worker`] binds a name to the function that performs its jobs, a
//! concurrency cap and optional success/failure callbacks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{JobRecord, QueueError};

/// Result type for `perform`.
pub type PerformResult = Result<(), String>;

/// Future type for async `perform` functions.
pub type PerformFuture = Pin<Box<dyn Future<Output = PerformResult> + Send>>;

type PerformFn = Arc<dyn Fn(serde_json::Value) -> PerformFuture + Send + Sync>;
type SuccessFn = Arc<dyn Fn(&JobRecord) + Send + Sync>;
type FailureFn = Arc<dyn Fn(&JobRecord, &str) + Send + Sync>;

/// Default concurrency cap for a worker type.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Descriptor for one worker type.
#[derive(Clone)]
pub struct Worker {
    name: String,
    concurrency: usize,
    perform: Option<PerformFn>,
    on_success: Option<SuccessFn>,
    on_failure: Option<FailureFn>,
}

impl Worker {
    /// Create a worker type with no `perform` and the default concurrency.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concurrency: DEFAULT_CONCURRENCY,
            perform: None,
            on_success: None,
            on_failure: None,
        }
    }

    /// Set the concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the function that performs a job from its arguments.
    pub fn with_perform<F, Fut>(mut self, perform: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PerformResult> + Send + 'static,
    {
        self.perform = Some(Arc::new(move |arguments| Box::pin(perform(arguments))));
        self
    }

    /// Called with the completed record after it has been persisted.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&JobRecord) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called with the failed record and the error after it has been persisted.
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&JobRecord, &str) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Check the descriptor can be dispatched against.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.perform.is_none() {
            return Err(QueueError::InvalidWorkerConfiguration(format!(
                "worker '{}' has no perform function",
                self.name
            )));
        }
        if self.concurrency == 0 {
            return Err(QueueError::InvalidWorkerConfiguration(format!(
                "worker '{}' must declare a positive concurrency",
                self.name
            )));
        }
        Ok(())
    }

    /// Start performing a job with the given arguments.
    pub fn perform(&self, arguments: serde_json::Value) -> Result<PerformFuture, QueueError> {
        let perform = self.perform.as_ref().ok_or_else(|| {
            QueueError::InvalidWorkerConfiguration(format!(
                "worker '{}' has no perform function",
                self.name
            ))
        })?;
        Ok(perform(arguments))
    }

    pub fn notify_success(&self, job: &JobRecord) {
        if let Some(callback) = &self.on_success {
            callback(job);
        }
    }

    pub fn notify_failure(&self, job: &JobRecord, error: &str) {
        if let Some(callback) = &self.on_failure {
            callback(job, error);
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("concurrency", &self.concurrency)
            .field("perform", &self.perform.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_perform_is_invalid() {
        let worker = Worker::new("thumbnails").with_concurrency(2);
        assert!(matches!(
            worker.validate(),
            Err(QueueError::InvalidWorkerConfiguration(_))
        ));
        assert!(worker.perform(serde_json::Value::Null).is_err());
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let worker = Worker::new("thumbnails")
            .with_concurrency(0)
            .with_perform(|_| async { Ok(()) });
        assert!(matches!(
            worker.validate(),
            Err(QueueError::InvalidWorkerConfiguration(_))
        ));
    }

    #[test]
    fn defaults_to_single_slot() {
        let worker = Worker::new("thumbnails").with_perform(|_| async { Ok(()) });
        assert_eq!(worker.concurrency(), DEFAULT_CONCURRENCY);
        assert!(worker.validate().is_ok());
    }
}
