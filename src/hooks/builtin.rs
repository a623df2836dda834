//! Plugins shipped with the connector, selectable by name in configuration.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::controller::Controller;
use crate::gateway::BotConnection;
use crate::storage::save_best_effort;

use super::plugin::{BotPlugin, PluginSet};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown plugin: {0}")]
pub struct UnknownPlugin(pub String);

/// Logs each live session
pub struct ConnectionLogPlugin;

#[async_trait]
impl BotPlugin for ConnectionLogPlugin {
    fn name(&self) -> &str {
        "connection-log"
    }

    async fn initialize(
        &self,
        controller: &Controller,
        _bot: Option<&BotConnection>,
    ) -> anyhow::Result<()> {
        tracing::info!(
            client_id = %controller.app().client_id,
            "Connection log enabled"
        );
        Ok(())
    }

    async fn on_bot_connected(
        &self,
        controller: &Controller,
        connection: &BotConnection,
    ) -> anyhow::Result<()> {
        tracing::info!(
            bot = %connection.identity(),
            connected_teams = controller.teams().len(),
            "Bot online"
        );
        Ok(())
    }

    async fn on_tick(&self, controller: &Controller) -> anyhow::Result<()> {
        tracing::trace!(connected_teams = controller.teams().len(), "Tick");
        Ok(())
    }
}

/// Stamps `last_connected_at` on the team record after each connection
pub struct TeamActivityPlugin;

impl TeamActivityPlugin {
    pub const METADATA_KEY: &'static str = "last_connected_at";
}

#[async_trait]
impl BotPlugin for TeamActivityPlugin {
    fn name(&self) -> &str {
        "team-activity"
    }

    async fn on_bot_connected(
        &self,
        controller: &Controller,
        connection: &BotConnection,
    ) -> anyhow::Result<()> {
        let store = controller.store();
        let Some(mut team) = store.get(connection.team_id()).await? else {
            tracing::debug!(team_id = %connection.team_id(), "No stored record to stamp");
            return Ok(());
        };

        team.metadata.insert(
            Self::METADATA_KEY.to_string(),
            Utc::now().to_rfc3339().into(),
        );
        save_best_effort(store.as_ref(), &team).await;
        Ok(())
    }
}

/// Build a plugin set from configured names, keeping their order
pub fn resolve_plugins(names: &[String]) -> Result<PluginSet, UnknownPlugin> {
    names
        .iter()
        .map(|name| -> Result<Arc<dyn BotPlugin>, UnknownPlugin> {
            match name.as_str() {
                "connection-log" => Ok(Arc::new(ConnectionLogPlugin)),
                "team-activity" => Ok(Arc::new(TeamActivityPlugin)),
                other => Err(UnknownPlugin(other.to_string())),
            }
        })
        .collect()
}
