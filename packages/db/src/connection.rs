//! Database connection management.

use std::path::{Path, PathBuf};

use queue_core::StoreError;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use thiserror::Error;

/// Database connection wrapper.
pub type Database = Surreal<Any>;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Connection endpoint: "mem://", "surrealkv://path" or "rocksdb://path"
    pub endpoint: String,
    /// Namespace to use
    pub namespace: String,
    /// Database name to use
    pub database: String,
    /// Optional root credentials for authentication
    pub credentials: Option<(String, String)>,
    /// On-disk location for durable endpoints
    pub path: Option<PathBuf>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "jobqueue".to_string(),
            database: "main".to_string(),
            credentials: None,
            path: None,
        }
    }
}

impl DbConfig {
    /// Create a config for in-memory testing.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a config for file-based persistence (SurrealKV engine).
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            endpoint: format!("surrealkv://{}", path.display()),
            path: Some(path),
            ..Default::default()
        }
    }

    /// Create a config for RocksDB persistence (requires rocksdb feature).
    pub fn rocksdb(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            endpoint: format!("rocksdb://{}", path.display()),
            path: Some(path),
            ..Default::default()
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set root credentials for authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Directory that must exist before a durable endpoint is opened.
    pub fn data_dir(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether data outlives the process.
    pub fn is_durable(&self) -> bool {
        self.path.is_some()
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not initialized - call initialize first")]
    NotInitialized,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Connection error: {0}")]
    Connection(#[from] surrealdb::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Query error: {0}")]
    Query(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotInitialized => StoreError::NotInitialized,
            DbError::InvalidConfig(msg) => StoreError::InvalidConfig(msg),
            DbError::Io(err) => StoreError::Io(err),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

/// Open a connection and select the configured namespace and database.
pub async fn connect_db(config: &DbConfig) -> Result<Database, DbError> {
    tracing::info!("Connecting to database: {}", config.endpoint);

    let db = connect(config.endpoint.as_str()).await?;

    // Authenticate if credentials provided
    if let Some((username, password)) = &config.credentials {
        db.signin(Root {
            username,
            password,
        })
        .await?;
    }

    db.use_ns(&config.namespace).use_db(&config.database).await?;

    tracing::info!(
        "Connected to database: {}/{}",
        config.namespace,
        config.database
    );

    Ok(db)
}
