//! Redis-based team store.
//!
//! Each team is stored as a JSON string under `{prefix}:team:{id}`; the set
//! `{prefix}:teams` indexes all stored team IDs.

use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::infrastructure::redis::RedisPool;
use crate::team::TeamRecord;

use super::backend::{StorageError, TeamStore};

pub struct RedisTeamStore {
    pool: Arc<RedisPool>,
    prefix: String,
}

impl RedisTeamStore {
    pub fn new(pool: Arc<RedisPool>, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    fn team_key(&self, team_id: &str) -> String {
        format!("{}:team:{}", self.prefix, team_id)
    }

    fn index_key(&self) -> String {
        format!("{}:teams", self.prefix)
    }
}

#[async_trait]
impl TeamStore for RedisTeamStore {
    fn backend_type(&self) -> &'static str {
        "redis"
    }

    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError> {
        let index = self.index_key();
        let mut ids: Vec<String> = self
            .pool
            .execute(|mut conn| async move { conn.smembers(&index).await })
            .await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ids.sort();

        let keys: Vec<String> = ids.iter().map(|id| self.team_key(id)).collect();
        let raw: Vec<Option<String>> = self
            .pool
            .execute(|mut conn| async move {
                redis::cmd("MGET").arg(&keys).query_async(&mut conn).await
            })
            .await?;

        let mut teams = Vec::with_capacity(raw.len());
        for (id, value) in ids.iter().zip(raw) {
            match value {
                Some(json) => teams.push(serde_json::from_str(&json)?),
                // Indexed but the record itself is gone
                None => tracing::warn!(team_id = %id, "Team indexed but not stored, skipping"),
            }
        }

        Ok(teams)
    }

    async fn get(&self, team_id: &str) -> Result<Option<TeamRecord>, StorageError> {
        let key = self.team_key(team_id);
        let raw: Option<String> = self
            .pool
            .execute(|mut conn| async move { conn.get(&key).await })
            .await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn save(&self, team: &TeamRecord) -> Result<(), StorageError> {
        let key = self.team_key(&team.id);
        let index = self.index_key();
        let id = team.id.clone();
        let json = serde_json::to_string(team)?;

        self.pool
            .execute(|mut conn| async move {
                redis::pipe()
                    .atomic()
                    .set(&key, json)
                    .ignore()
                    .sadd(&index, id)
                    .ignore()
                    .query_async::<()>(&mut conn)
                    .await
            })
            .await?;

        tracing::trace!(team_id = %team.id, "Team saved to Redis");
        Ok(())
    }
}
