//! Infrastructure layer modules
//!
//! Shared building blocks for the storage backends:
//! - `circuit_breaker`: fail-fast guard around a backend
//! - `postgres`: PostgreSQL connection pool
//! - `redis`: Redis connection pool

mod circuit_breaker;
pub mod postgres;
pub mod redis;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
