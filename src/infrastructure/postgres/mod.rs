//! PostgreSQL infrastructure used by the Postgres team store.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
