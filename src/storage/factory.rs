//! Team store factory

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::infrastructure::postgres::PostgresPool;
use crate::infrastructure::redis::RedisPool;

use super::backend::TeamStore;
use super::memory_backend::MemoryTeamStore;
use super::postgres_backend::PostgresTeamStore;
use super::redis_backend::RedisTeamStore;

/// Create a team store based on configuration.
///
/// - `"postgres"`: `PostgresTeamStore` if a PostgreSQL pool is provided
/// - `"redis"`: `RedisTeamStore` if a Redis pool is provided
/// - `"memory"` (default): `MemoryTeamStore`
///
/// A backend whose pool is missing falls back to memory.
pub fn create_team_store(
    settings: &StorageConfig,
    redis_pool: Option<Arc<RedisPool>>,
    postgres_pool: Option<PostgresPool>,
) -> Arc<dyn TeamStore> {
    match settings.backend.as_str() {
        "postgres" => match postgres_pool {
            Some(pool) => {
                tracing::info!(backend = "postgres", "Creating PostgreSQL team store");
                Arc::new(PostgresTeamStore::new(pool))
            }
            None => {
                tracing::warn!("PostgreSQL store requested but no pool provided, falling back to memory");
                Arc::new(MemoryTeamStore::new())
            }
        },
        "redis" => match redis_pool {
            Some(pool) => {
                tracing::info!(
                    backend = "redis",
                    prefix = %settings.redis_prefix,
                    "Creating Redis team store"
                );
                Arc::new(RedisTeamStore::new(pool, settings.redis_prefix.clone()))
            }
            None => {
                tracing::warn!("Redis store requested but no pool provided, falling back to memory");
                Arc::new(MemoryTeamStore::new())
            }
        },
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-memory team store");
            Arc::new(MemoryTeamStore::new())
        }
        other => {
            tracing::warn!(backend = %other, "Unknown storage backend, falling back to memory");
            Arc::new(MemoryTeamStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(backend: &str) -> StorageConfig {
        StorageConfig {
            backend: backend.to_string(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_memory_backend() {
        assert_eq!(create_team_store(&settings("memory"), None, None).backend_type(), "memory");
    }

    #[test]
    fn test_missing_pool_falls_back_to_memory() {
        assert_eq!(create_team_store(&settings("redis"), None, None).backend_type(), "memory");
        assert_eq!(create_team_store(&settings("postgres"), None, None).backend_type(), "memory");
    }

    #[test]
    fn test_unknown_backend_falls_back_to_memory() {
        assert_eq!(create_team_store(&settings("mongo"), None, None).backend_type(), "memory");
    }
}
