//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// Every statement is `IF NOT EXISTS`, so reopening an existing database
/// leaves it untouched.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(JOB_SCHEMA).await?.check()?;
    db.query(SEQUENCE_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Job table schema.
const JOB_SCHEMA: &str = r#"
-- Job table, one record per job keyed by its identity
DEFINE TABLE IF NOT EXISTS job SCHEMALESS;

-- Indexes for status-filtered and per-worker queries
DEFINE INDEX IF NOT EXISTS job_identity ON job FIELDS job_id UNIQUE;
DEFINE INDEX IF NOT EXISTS job_status ON job FIELDS status;
DEFINE INDEX IF NOT EXISTS job_worker ON job FIELDS worker;
"#;

/// Identity sequence schema.
const SEQUENCE_SCHEMA: &str = r#"
-- Single-record table holding the last assigned job identity
DEFINE TABLE IF NOT EXISTS job_sequence SCHEMALESS;
"#;
