//! Redis infrastructure used by the Redis team store.

pub mod pool;

pub use pool::{PoolError, RedisPool};
