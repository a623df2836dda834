use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::health;
use super::metrics::prometheus_metrics;
use super::teams::{connect_team, connected_teams};

pub fn api_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/teams/{team_id}/connect", post(connect_team))
        .route_layer(middleware::from_fn_with_state(state, api_key_auth));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .route("/teams/connected", get(connected_teams))
                .merge(admin),
        )
}
