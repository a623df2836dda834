//! Persistence adapter for team records.
//!
//! The connector reads every team at startup and writes a team back only
//! after purging revoked credentials. Storage engines plug in behind the
//! [`TeamStore`] trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::infrastructure::postgres::PostgresPoolError;
use crate::infrastructure::redis::PoolError;
use crate::team::TeamRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] PoolError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] PostgresPoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend cannot serve requests right now
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Backend type identifier (`memory`, `redis`, `postgres`)
    fn backend_type(&self) -> &'static str;

    /// Load every stored team
    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError>;

    async fn get(&self, team_id: &str) -> Result<Option<TeamRecord>, StorageError>;

    /// Insert or replace a team record
    async fn save(&self, team: &TeamRecord) -> Result<(), StorageError>;
}
