//! A single connection attempt for one team, shared by the bootstrap and
//! bot-created paths.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::controller::Controller;
use crate::gateway::{AuthRevokedReason, BotConnection, ConnectError};
use crate::hooks::HookDispatcher;
use crate::metrics::{AttemptMetrics, CREDENTIALS_PURGED_TOTAL, TEAMS_CONNECTED};
use crate::registry::{AddOutcome, ConnectClaim};
use crate::storage::{save_best_effort, SaveOutcome};
use crate::team::TeamRecord;

/// Where an attempt originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPath {
    Bootstrap,
    BotCreated,
}

/// What to do with stored credentials when the gateway reports them revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationPolicy {
    /// Drop the bot credentials and persist the record
    PurgeCredentials,
    LogOnly,
}

impl AttemptPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptPath::Bootstrap => "bootstrap",
            AttemptPath::BotCreated => "bot_created",
        }
    }

    // Only teams loaded from storage at startup get their credentials purged;
    // a freshly installed team keeps them.
    pub fn revocation_policy(&self) -> RevocationPolicy {
        match self {
            AttemptPath::Bootstrap => RevocationPolicy::PurgeCredentials,
            AttemptPath::BotCreated => RevocationPolicy::LogOnly,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// Session open and registered
    Connected(BotConnection),
    /// Session opened, but its reconnection was exhausted before it could
    /// be registered
    Superseded(BotConnection),
    AuthRevoked {
        reason: AuthRevokedReason,
        /// Result of persisting the purge; `None` when credentials were kept
        purge: Option<SaveOutcome>,
    },
    Failed(ConnectError),
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Connected(_) => "connected",
            AttemptOutcome::Superseded(_) => "superseded",
            AttemptOutcome::AuthRevoked { .. } => "auth_revoked",
            AttemptOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, AttemptOutcome::Connected(_))
    }
}

/// Open a session for `team` and record the result.
///
/// The claim is held until the registry reflects the outcome.
pub async fn run_attempt(
    controller: &Controller,
    mut team: TeamRecord,
    path: AttemptPath,
    claim: ConnectClaim,
) -> AttemptOutcome {
    let handle = controller.driver().spawn(&team);

    let outcome = match handle.connect().await {
        Ok(connection) => register(controller, &claim, connection, path).await,
        Err(e) => match e.revoked_reason() {
            Some(reason) => {
                tracing::error!(
                    team_id = %team.id,
                    path = path.as_str(),
                    reason = %reason,
                    "Bot credentials revoked"
                );
                let purge = match path.revocation_policy() {
                    RevocationPolicy::PurgeCredentials => {
                        Some(purge_credentials(controller, &mut team).await)
                    }
                    RevocationPolicy::LogOnly => None,
                };
                AttemptOutcome::AuthRevoked { reason, purge }
            }
            None => {
                tracing::error!(
                    team_id = %team.id,
                    path = path.as_str(),
                    error = %e,
                    "Error connecting bot to RTM"
                );
                AttemptOutcome::Failed(e)
            }
        },
    };

    AttemptMetrics::record(path.as_str(), outcome.as_str());
    drop(claim);
    outcome
}

/// Claim `team` and run the attempt on its own task.
///
/// Returns `None` when the team is already connected or an attempt for it
/// is in flight.
pub fn spawn_attempt(
    controller: &Arc<Controller>,
    team: TeamRecord,
    path: AttemptPath,
) -> Option<JoinHandle<AttemptOutcome>> {
    let Some(claim) = controller.teams().begin_connect(&team.id) else {
        AttemptMetrics::record(path.as_str(), "skipped");
        return None;
    };

    let controller = Arc::clone(controller);
    Some(tokio::spawn(async move {
        run_attempt(&controller, team, path, claim).await
    }))
}

async fn register(
    controller: &Controller,
    claim: &ConnectClaim,
    connection: BotConnection,
    path: AttemptPath,
) -> AttemptOutcome {
    let teams = controller.teams();

    // Registered under the stored team ID so the idempotency check and the
    // in-flight claim agree
    if connection.team_id() != claim.team_id() {
        tracing::warn!(
            team_id = %claim.team_id(),
            gateway_team_id = %connection.team_id(),
            "Gateway reported a different team ID"
        );
    }

    match teams.add(claim.team_id(), connection.session_id) {
        AddOutcome::Added => {
            TEAMS_CONNECTED.set(teams.len() as i64);
            HookDispatcher::bot_connected(controller.plugins(), controller, &connection).await;

            match path {
                AttemptPath::Bootstrap => {
                    tracing::info!(bot = %connection.identity(), "Bot added from storage")
                }
                AttemptPath::BotCreated => {
                    tracing::info!(bot = %connection.identity(), "Added bot")
                }
            }
            AttemptOutcome::Connected(connection)
        }
        AddOutcome::Retired => {
            tracing::warn!(
                bot = %connection.identity(),
                "Session failed before it was registered"
            );
            AttemptOutcome::Superseded(connection)
        }
    }
}

async fn purge_credentials(controller: &Controller, team: &mut TeamRecord) -> SaveOutcome {
    if team.purge_credentials().is_some() {
        CREDENTIALS_PURGED_TOTAL.inc();
    }

    let outcome = save_best_effort(controller.store().as_ref(), team).await;
    if outcome.is_saved() {
        tracing::info!(team_id = %team.id, "Removed revoked bot credentials");
    }
    outcome
}
