//! Startup reconnection of every stored team.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::controller::Controller;
use crate::storage::StorageError;
use crate::team::TeamId;

use super::attempt::{run_attempt, AttemptOutcome, AttemptPath};

pub struct Bootstrapper {
    controller: Arc<Controller>,
}

impl Bootstrapper {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// Load every stored team and start one connection attempt per team
    /// holding bot credentials.
    ///
    /// Fails only when the teams cannot be loaded. Attempts run concurrently
    /// on their own tasks; await [`BootstrapHandle::wait`] to collect them.
    #[tracing::instrument(
        name = "bootstrap.run",
        skip(self),
        fields(backend = self.controller.store().backend_type())
    )]
    pub async fn run(&self) -> Result<BootstrapHandle, StorageError> {
        let teams = self.controller.store().all().await?;
        let total = teams.len();

        let mut attempts = JoinSet::new();
        let mut attempted = Vec::new();
        let mut skipped = Vec::new();

        for team in teams {
            if !team.has_credentials() {
                tracing::debug!(team_id = %team.id, "Team has no bot, skipping");
                skipped.push(team.id);
                continue;
            }

            let Some(claim) = self.controller.teams().begin_connect(&team.id) else {
                tracing::debug!(team_id = %team.id, "Team already connecting, skipping");
                skipped.push(team.id);
                continue;
            };

            attempted.push(team.id.clone());
            let controller = Arc::clone(&self.controller);
            attempts.spawn(async move {
                let team_id = team.id.clone();
                let outcome = run_attempt(&controller, team, AttemptPath::Bootstrap, claim).await;
                (team_id, outcome)
            });
        }

        tracing::info!(
            teams = total,
            attempted = attempted.len(),
            skipped = skipped.len(),
            "Reconnecting stored teams"
        );

        Ok(BootstrapHandle {
            attempted,
            skipped,
            attempts,
        })
    }
}

/// In-flight bootstrap attempts
pub struct BootstrapHandle {
    attempted: Vec<TeamId>,
    skipped: Vec<TeamId>,
    attempts: JoinSet<(TeamId, AttemptOutcome)>,
}

impl BootstrapHandle {
    /// Teams a connection attempt was started for
    pub fn attempted(&self) -> &[TeamId] {
        &self.attempted
    }

    /// Teams without credentials, or already being connected
    pub fn skipped(&self) -> &[TeamId] {
        &self.skipped
    }

    /// Wait for every attempt to finish
    pub async fn wait(mut self) -> BootstrapReport {
        let mut report = BootstrapReport {
            skipped: self.skipped.len(),
            ..BootstrapReport::default()
        };

        while let Some(joined) = self.attempts.join_next().await {
            match joined {
                Ok((_, AttemptOutcome::Connected(_))) => report.connected += 1,
                Ok((_, AttemptOutcome::Superseded(_))) => report.superseded += 1,
                Ok((team_id, AttemptOutcome::AuthRevoked { .. })) => report.revoked.push(team_id),
                Ok((team_id, AttemptOutcome::Failed(_))) => report.failed.push(team_id),
                Err(e) => {
                    tracing::error!(error = %e, "Bootstrap attempt task failed");
                }
            }
        }

        report.revoked.sort();
        report.failed.sort();
        report
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub connected: usize,
    pub superseded: usize,
    /// Teams whose credentials were reported revoked
    pub revoked: Vec<TeamId>,
    pub failed: Vec<TeamId>,
    pub skipped: usize,
}
