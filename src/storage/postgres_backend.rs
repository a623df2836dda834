//! PostgreSQL-based team store.
//!
//! Team records are kept whole as JSONB so fields the connector does not
//! know about survive a purge-and-save.

use async_trait::async_trait;

use crate::infrastructure::postgres::PostgresPool;
use crate::team::TeamRecord;

use super::backend::{StorageError, TeamStore};

/// Table structure:
/// - `teams(id TEXT PRIMARY KEY, data JSONB, updated_at TIMESTAMPTZ)`
pub struct PostgresTeamStore {
    pool: PostgresPool,
}

impl PostgresTeamStore {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// Create the `teams` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.pool
            .execute(|pool| async move {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS teams (
                        id TEXT PRIMARY KEY,
                        data JSONB NOT NULL,
                        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    )
                    "#,
                )
                .execute(&pool)
                .await
                .map(|_| ())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TeamStore for PostgresTeamStore {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError> {
        let rows: Vec<(serde_json::Value,)> = self
            .pool
            .execute(|pool| async move {
                sqlx::query_as("SELECT data FROM teams ORDER BY id")
                    .fetch_all(&pool)
                    .await
            })
            .await?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StorageError::from))
            .collect()
    }

    async fn get(&self, team_id: &str) -> Result<Option<TeamRecord>, StorageError> {
        let id = team_id.to_string();
        let row: Option<(serde_json::Value,)> = self
            .pool
            .execute(|pool| async move {
                sqlx::query_as("SELECT data FROM teams WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&pool)
                    .await
            })
            .await?;

        row.map(|(data,)| serde_json::from_value(data))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn save(&self, team: &TeamRecord) -> Result<(), StorageError> {
        let id = team.id.clone();
        let data = serde_json::to_value(team)?;

        self.pool
            .execute(|pool| async move {
                sqlx::query(
                    r#"
                    INSERT INTO teams (id, data, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (id) DO UPDATE
                    SET data = EXCLUDED.data, updated_at = NOW()
                    "#,
                )
                .bind(id)
                .bind(data)
                .execute(&pool)
                .await
                .map(|_| ())
            })
            .await?;

        tracing::trace!(team_id = %team.id, "Team saved to PostgreSQL");
        Ok(())
    }
}
