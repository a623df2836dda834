//! Connected-team inspection and manual reconnection.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::registry::ConnectedTeam;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ConnectedTeamsResponse {
    pub count: usize,
    pub connecting: usize,
    pub teams: Vec<ConnectedTeam>,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub team_id: String,
    pub status: &'static str,
}

/// GET /api/v1/teams/connected
pub async fn connected_teams(State(state): State<AppState>) -> Json<ConnectedTeamsResponse> {
    let teams = state.controller.teams();
    let entries = teams.snapshot();

    Json(ConnectedTeamsResponse {
        count: entries.len(),
        connecting: teams.connecting_count(),
        teams: entries,
    })
}

/// POST /api/v1/teams/{team_id}/connect
///
/// Re-publishes a stored team as bot-created so the lifecycle controller
/// opens a session for it.
pub async fn connect_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<(StatusCode, Json<ConnectResponse>)> {
    let controller = &state.controller;

    if controller.teams().contains(&team_id) {
        return Err(AppError::Conflict(format!("team {} is already connected", team_id)));
    }

    let team = controller
        .store()
        .get(&team_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("team {}", team_id)))?;

    if !team.has_credentials() {
        return Err(AppError::Conflict(format!("team {} has no bot credentials", team_id)));
    }

    controller.events().bot_created(team)?;
    tracing::info!(team_id = %team_id, "Manual reconnect requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(ConnectResponse {
            team_id,
            status: "queued",
        }),
    ))
}
