// Infrastructure layer (shared components)
pub mod infrastructure;

// Ambient stack
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer
pub mod events;
pub mod gateway;
pub mod hooks;
pub mod registry;
pub mod storage;
pub mod team;

// Connection lifecycle
pub mod connector;
pub mod controller;
pub mod lifecycle;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod shutdown;
pub mod tasks;
