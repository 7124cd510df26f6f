//! Registry of queue coordinators keyed by worker name.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ractor::ActorRef;

use crate::error::{EngineError, EngineResult};
use crate::messages::CoordinatorMessage;

/// Maps each registered worker name to its coordinator.
///
/// Owned by an [`Engine`](crate::Engine), so independent engines never share
/// coordinators.
pub struct CoordinatorRegistry {
    coordinators: RwLock<HashMap<String, ActorRef<CoordinatorMessage>>>,
}

impl CoordinatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            coordinators: RwLock::new(HashMap::new()),
        }
    }

    /// Register a coordinator. Fails if the worker name is taken.
    pub fn register(
        &self,
        worker: &str,
        coordinator: ActorRef<CoordinatorMessage>,
    ) -> EngineResult<()> {
        let mut coordinators = self.write();
        if coordinators.contains_key(worker) {
            return Err(EngineError::WorkerAlreadyRegistered(worker.to_string()));
        }
        coordinators.insert(worker.to_string(), coordinator);
        Ok(())
    }

    /// Unregister a coordinator, returning it if present.
    pub fn unregister(&self, worker: &str) -> Option<ActorRef<CoordinatorMessage>> {
        self.write().remove(worker)
    }

    /// Get a coordinator by worker name.
    pub fn get(&self, worker: &str) -> Option<ActorRef<CoordinatorMessage>> {
        self.read().get(worker).cloned()
    }

    pub fn contains(&self, worker: &str) -> bool {
        self.read().contains_key(worker)
    }

    /// List all registered worker names, sorted.
    pub fn list_workers(&self) -> Vec<String> {
        let mut workers: Vec<String> = self.read().keys().cloned().collect();
        workers.sort();
        workers
    }

    /// Remove and return every coordinator.
    pub fn drain(&self) -> Vec<(String, ActorRef<CoordinatorMessage>)> {
        self.write().drain().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ActorRef<CoordinatorMessage>>> {
        self.coordinators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ActorRef<CoordinatorMessage>>> {
        self.coordinators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CoordinatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
