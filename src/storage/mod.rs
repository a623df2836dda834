//! Team persistence: storage backends and save policies.

mod backend;
mod factory;
mod memory_backend;
mod policy;
mod postgres_backend;
mod redis_backend;

pub use backend::{StorageError, TeamStore};
pub use factory::create_team_store;
pub use memory_backend::MemoryTeamStore;
pub use policy::{save_best_effort, SaveOutcome};
pub use postgres_backend::PostgresTeamStore;
pub use redis_backend::RedisTeamStore;
