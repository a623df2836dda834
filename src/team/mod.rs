//! Persisted team (tenant) records.
//!
//! A `TeamRecord` is created by the install flow and read at startup. The
//! connector itself only ever mutates one thing on it: the bot credentials are
//! dropped once the gateway reports them as permanently revoked.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a team as assigned by the chat platform (e.g. `T024BE7LD`).
pub type TeamId = String;

/// Bot credentials granted to the integration when a team installed it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCredentials {
    /// Bot access token
    pub token: String,
    /// Bot user ID on the team
    pub user_id: String,
    /// Installing user, when the install flow recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl BotCredentials {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            created_by: None,
        }
    }
}

// Tokens never end up in log lines.
impl fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCredentials")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .field("created_by", &self.created_by)
            .finish()
    }
}

/// A team that installed the integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    /// Absent when the team never finished installing or its credentials were revoked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<BotCredentials>,
    /// Any other fields the install flow stored (name, domain, url, ...)
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl TeamRecord {
    pub fn new(id: impl Into<TeamId>) -> Self {
        Self {
            id: id.into(),
            bot: None,
            metadata: Map::new(),
        }
    }

    pub fn with_bot(mut self, bot: BotCredentials) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the team holds bot credentials and is therefore eligible for a session
    pub fn has_credentials(&self) -> bool {
        self.bot.is_some()
    }

    /// Drop the bot credentials, returning them if there were any
    pub fn purge_credentials(&mut self) -> Option<BotCredentials> {
        self.bot.take()
    }

    /// Display name stored by the install flow, if any
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }
}
