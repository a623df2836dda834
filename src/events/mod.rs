//! Typed gateway lifecycle events.
//!
//! The gateway driver and the install flow publish events through an
//! [`EventSender`]; the lifecycle controller is the only consumer and owns
//! the matching [`EventReceiver`]. The channel is unbounded so a slow
//! consumer never causes a reconnect-failure to be dropped.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::gateway::{BotConnection, ConnectError};
use crate::team::TeamRecord;

/// A team finished installing while the process is running
#[derive(Debug, Clone)]
pub struct BotCreated {
    pub team: TeamRecord,
}

/// An established session exhausted its automatic reconnection
#[derive(Debug, Clone)]
pub struct ReconnectFailed {
    pub connection: BotConnection,
    pub error: ConnectError,
}

/// An established session dropped and the driver reconnected it
#[derive(Debug, Clone)]
pub struct Reconnected {
    pub connection: BotConnection,
}

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    BotCreated(BotCreated),
    ReconnectFailed(ReconnectFailed),
    Reconnected(Reconnected),
}

impl GatewayEvent {
    /// Event name as used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BotCreated(_) => "create_bot",
            Self::ReconnectFailed(_) => "reconnect_failed",
            Self::Reconnected(_) => "reconnected",
        }
    }

    pub fn team_id(&self) -> &str {
        match self {
            Self::BotCreated(e) => &e.team.id,
            Self::ReconnectFailed(e) => e.connection.team_id(),
            Self::Reconnected(e) => e.connection.team_id(),
        }
    }
}

/// Returned when the lifecycle controller is no longer consuming events
#[derive(Debug, Error)]
#[error("event bus closed, dropping {kind} event for team {team_id}")]
pub struct EventBusClosed {
    pub kind: &'static str,
    pub team_id: String,
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Publishing side of the event bus
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<GatewayEvent>,
}

impl EventSender {
    pub fn send(&self, event: GatewayEvent) -> Result<(), EventBusClosed> {
        self.tx.send(event).map_err(|mpsc::error::SendError(event)| {
            let closed = EventBusClosed {
                kind: event.kind(),
                team_id: event.team_id().to_string(),
            };
            tracing::warn!(error = %closed, "Gateway event not delivered");
            closed
        })
    }

    pub fn bot_created(&self, team: TeamRecord) -> Result<(), EventBusClosed> {
        self.send(GatewayEvent::BotCreated(BotCreated { team }))
    }

    pub fn reconnect_failed(
        &self,
        connection: BotConnection,
        error: ConnectError,
    ) -> Result<(), EventBusClosed> {
        self.send(GatewayEvent::ReconnectFailed(ReconnectFailed { connection, error }))
    }

    pub fn reconnected(&self, connection: BotConnection) -> Result<(), EventBusClosed> {
        self.send(GatewayEvent::Reconnected(Reconnected { connection }))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming side of the event bus
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<GatewayEvent>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<GatewayEvent> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued
    pub fn try_recv(&mut self) -> Option<GatewayEvent> {
        self.rx.try_recv().ok()
    }
}
