//! Job store backends for the job queue system.
//!
//! This crate provides the two [`JobStore`](queue_core::JobStore)
//! implementations and the configuration that selects between them.
//!
//! # Features
//!
//! - `memory` (default): `mem://` endpoints, always compiled in
//! - `surrealkv` (default): durable file-based storage via SurrealKV
//! - `rocksdb`: durable storage via RocksDB

mod connection;
mod memory;
mod schema;
mod store;
mod surreal;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect_db};
pub use memory::MemoryStore;
pub use schema::init_schema;
pub use store::{DEFAULT_STORE_PATH, Store, StoreConfig};
pub use surreal::SurrealStore;
