//! Event-driven handling of runtime connection lifecycle changes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::controller::Controller;
use crate::events::{BotCreated, EventReceiver, GatewayEvent, ReconnectFailed, Reconnected};
use crate::hooks::{DispatchReport, HookDispatcher};
use crate::metrics::{RECONNECT_FAILED_TOTAL, TEAMS_CONNECTED};
use crate::registry::ConnectedTeam;

use super::attempt::{spawn_attempt, AttemptOutcome, AttemptPath};

/// What handling one event did
#[derive(Debug)]
pub enum EventOutcome {
    /// A connection attempt was started
    AttemptSpawned(JoinHandle<AttemptOutcome>),
    AlreadyConnected,
    /// Another attempt for the team is in flight
    AttemptInFlight,
    /// The team's registry entry, if it had one
    Removed(Option<ConnectedTeam>),
    HooksDispatched(DispatchReport),
    /// Reconnection of a session no longer in the registry
    Ignored,
}

/// Sole consumer of gateway lifecycle events
pub struct LifecycleController {
    controller: Arc<Controller>,
}

impl LifecycleController {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// Consume events until shutdown or until every sender is gone
    pub async fn run(self, mut events: EventReceiver, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Lifecycle controller started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Lifecycle controller received shutdown signal");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle(event).await;
                    }
                    None => {
                        tracing::warn!("Event bus closed");
                        break;
                    }
                },
            }
        }

        tracing::info!("Lifecycle controller stopped");
    }

    pub async fn handle(&self, event: GatewayEvent) -> EventOutcome {
        tracing::debug!(kind = event.kind(), team_id = %event.team_id(), "Lifecycle event");

        match event {
            GatewayEvent::BotCreated(e) => self.on_bot_created(e),
            GatewayEvent::ReconnectFailed(e) => self.on_reconnect_failed(e),
            GatewayEvent::Reconnected(e) => self.on_reconnected(e).await,
        }
    }

    /// A team installed the integration. Connecting a team that already has
    /// a live session, or one being connected, is a no-op.
    #[tracing::instrument(
        name = "lifecycle.bot_created",
        skip_all,
        fields(team_id = %event.team.id)
    )]
    pub fn on_bot_created(&self, event: BotCreated) -> EventOutcome {
        let teams = self.controller.teams();
        let team_id = event.team.id.clone();

        if teams.contains(&team_id) {
            tracing::debug!("Team already connected, ignoring");
            return EventOutcome::AlreadyConnected;
        }

        match spawn_attempt(&self.controller, event.team, AttemptPath::BotCreated) {
            Some(handle) => EventOutcome::AttemptSpawned(handle),
            // The competing attempt may have registered in the meantime
            None if teams.contains(&team_id) => EventOutcome::AlreadyConnected,
            None => {
                tracing::debug!("Connection attempt already in flight, ignoring");
                EventOutcome::AttemptInFlight
            }
        }
    }

    /// A session gave up reconnecting. The team leaves the registry; stored
    /// credentials are left alone.
    #[tracing::instrument(
        name = "lifecycle.reconnect_failed",
        skip_all,
        fields(team_id = %event.connection.team_id(), session_id = %event.connection.session_id)
    )]
    pub fn on_reconnect_failed(&self, event: ReconnectFailed) -> EventOutcome {
        RECONNECT_FAILED_TOTAL.inc();
        tracing::error!(
            bot = %event.connection.identity(),
            error = %event.error,
            "RTM reconnect failed"
        );

        let teams = self.controller.teams();
        let team_id = event.connection.team_id();

        // Retire before removing: an attempt still registering this session
        // either sees the retirement or has already registered and is removed
        if teams.retire_session(team_id, event.connection.session_id) {
            tracing::debug!("Attempt in flight, session retired");
        }
        let removed = teams.remove(team_id);

        TEAMS_CONNECTED.set(teams.len() as i64);
        EventOutcome::Removed(removed)
    }

    /// A session reconnected on its own; registered teams get their
    /// connected hooks again.
    pub async fn on_reconnected(&self, event: Reconnected) -> EventOutcome {
        let connection = event.connection;
        if !self.controller.teams().contains(connection.team_id()) {
            tracing::debug!(
                team_id = %connection.team_id(),
                "Reconnected team is not registered, ignoring"
            );
            return EventOutcome::Ignored;
        }

        tracing::info!(bot = %connection.identity(), "Bot reconnected");
        let report = HookDispatcher::bot_connected(
            self.controller.plugins(),
            &self.controller,
            &connection,
        )
        .await;
        EventOutcome::HooksDispatched(report)
    }
}
