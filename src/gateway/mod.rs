//! Real-time messaging gateway abstraction.
//!
//! A [`GatewayDriver`] turns a stored team record into a [`BotHandle`];
//! connecting the handle opens the team's live session and yields a
//! [`BotConnection`]. From then on the driver owns the session: it reconnects
//! on transient drops and publishes `Reconnected` / `ReconnectFailed` events.

mod backoff;
pub mod slack;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use slack::{SlackDriverConfig, SlackRtmDriver};

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::team::TeamRecord;

/// Gateway error codes meaning the credentials are permanently unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthRevokedReason {
    AccountInactive,
    InvalidAuth,
}

impl AuthRevokedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountInactive => "account_inactive",
            Self::InvalidAuth => "invalid_auth",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "account_inactive" => Some(Self::AccountInactive),
            "invalid_auth" => Some(Self::InvalidAuth),
            _ => None,
        }
    }
}

impl fmt::Display for AuthRevokedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session could not be opened or kept open
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("authentication revoked: {0}")]
    AuthRevoked(AuthRevokedReason),

    #[error("gateway API error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("team has no bot credentials")]
    MissingCredentials,

    #[error("reconnection exhausted after {attempts} attempts: {last_error}")]
    ReconnectExhausted { attempts: u32, last_error: String },
}

impl ConnectError {
    /// Classify an error code returned by the gateway API
    pub fn from_api_code(code: &str) -> Self {
        match AuthRevokedReason::from_code(code) {
            Some(reason) => Self::AuthRevoked(reason),
            None => Self::Api(code.to_string()),
        }
    }

    /// Whether this error means the credentials must be considered revoked
    pub fn is_auth_revoked(&self) -> bool {
        matches!(self, Self::AuthRevoked(_))
    }

    pub fn revoked_reason(&self) -> Option<AuthRevokedReason> {
        match self {
            Self::AuthRevoked(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

/// Runtime handle for one team's live session.
///
/// `session_id` identifies the logical session and survives the driver's
/// internal reconnections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotConnection {
    pub session_id: Uuid,
    pub team: TeamInfo,
    pub identity: BotIdentity,
    pub connected_at: DateTime<Utc>,
}

impl BotConnection {
    pub fn new(team: TeamInfo, identity: BotIdentity) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            team,
            identity,
            connected_at: Utc::now(),
        }
    }

    /// Minimal connection for a team, used by drivers that know nothing more
    pub fn for_team(team_id: &str, bot_id: &str, bot_name: &str) -> Self {
        Self::new(
            TeamInfo {
                id: team_id.to_string(),
                name: None,
                domain: None,
            },
            BotIdentity {
                id: bot_id.to_string(),
                name: bot_name.to_string(),
            },
        )
    }

    pub fn team_id(&self) -> &str {
        &self.team.id
    }

    /// Human-readable bot identity for log lines
    pub fn identity(&self) -> String {
        match &self.team.name {
            Some(team_name) => format!("{} ({} / {})", self.identity.name, team_name, self.team.id),
            None => format!("{} ({})", self.identity.name, self.team.id),
        }
    }
}

/// A spawned, not yet connected bot for one team
#[async_trait]
pub trait BotHandle: Send + Sync {
    fn team_id(&self) -> &str;

    /// Open the live session
    async fn connect(&self) -> Result<BotConnection, ConnectError>;
}

/// Driver for the real-time messaging gateway
pub trait GatewayDriver: Send + Sync {
    /// Driver name for logs
    fn name(&self) -> &str;

    fn spawn(&self, team: &TeamRecord) -> Box<dyn BotHandle>;
}
