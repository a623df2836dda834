//! Admin HTTP API.

mod health;
mod metrics;
mod routes;
mod teams;

pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use teams::{connect_team, connected_teams};
