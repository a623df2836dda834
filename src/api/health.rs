//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::infrastructure::CircuitState;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `live` or `ticking`
    pub mode: String,
    pub storage: StorageHealthResponse,
    pub teams: TeamsHealthResponse,
    pub plugins: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StorageHealthResponse {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamsHealthResponse {
    pub connected: usize,
    pub connecting: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let controller = &state.controller;
    let breaker_state = state.storage_breaker.as_ref().map(|cb| cb.state());

    let status = match breaker_state {
        Some(CircuitState::Open) => "degraded",
        _ => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        mode: if state.start_rtm { "live" } else { "ticking" }.to_string(),
        storage: StorageHealthResponse {
            backend: controller.store().backend_type().to_string(),
            circuit_breaker: breaker_state.map(|s| s.as_str().to_string()),
        },
        teams: TeamsHealthResponse {
            connected: controller.teams().len(),
            connecting: controller.teams().connecting_count(),
        },
        plugins: controller.plugins().names(),
    })
}
