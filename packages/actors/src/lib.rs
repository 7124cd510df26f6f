//! Actor system for the job engine.
//!
//! This crate runs one Ractor coordinator per registered worker type on top of
//! a [`JobStore`](queue_core::JobStore).
//!
//! # Architecture
//!
//! - `Engine` - Owns the store, the coordinator registry and the event channel
//! - `QueueCoordinator` - Serializes all changes to one worker's dispatch queue
//! - Execution slots - Tokio tasks running `perform` and reporting back by message
//!
//! # Usage
//!
//! ```ignore
//! use actors::Engine;
//! use db::MemoryStore;
//! use queue_core::Worker;
//!
//! let engine = Engine::new(MemoryStore::new());
//! engine.initialize_store().await?;
//! engine.register(Worker::new("echo").with_perform(|_| async { Ok(()) })).await?;
//! engine.recover().await?;
//!
//! let id = engine.enqueue("echo", serde_json::json!({ "msg": "hi" })).await?;
//! ```

mod coordinator;
mod engine;
mod error;
mod execution;
mod messages;
pub mod registry;

pub use coordinator::{CoordinatorArgs, CoordinatorState, QueueCoordinator};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use messages::CoordinatorMessage;
pub use registry::CoordinatorRegistry;

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
