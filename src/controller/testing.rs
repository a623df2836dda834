//! Helpers for unit tests that need a `Controller`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SlackAppConfig;
use crate::events::{self, EventReceiver};
use crate::gateway::{BotConnection, BotHandle, ConnectError, GatewayDriver};
use crate::hooks::PluginSet;
use crate::storage::MemoryTeamStore;
use crate::team::TeamRecord;

use super::Controller;

/// Driver whose sessions never open
pub(crate) struct OfflineDriver;

struct OfflineBot(String);

#[async_trait]
impl BotHandle for OfflineBot {
    fn team_id(&self) -> &str {
        &self.0
    }

    async fn connect(&self) -> Result<BotConnection, ConnectError> {
        Err(ConnectError::Transport("offline".into()))
    }
}

impl GatewayDriver for OfflineDriver {
    fn name(&self) -> &str {
        "offline"
    }

    fn spawn(&self, team: &TeamRecord) -> Box<dyn BotHandle> {
        Box::new(OfflineBot(team.id.clone()))
    }
}

pub(crate) fn app_config() -> SlackAppConfig {
    SlackAppConfig {
        client_id: "123.456".into(),
        client_secret: "secret".into(),
        redirect_uri: None,
        state: None,
        scopes: vec!["bot".into()],
        api_base_url: "http://127.0.0.1:9".into(),
    }
}

pub(crate) fn controller(plugins: PluginSet) -> (Arc<Controller>, EventReceiver) {
    let (tx, rx) = events::channel();
    let controller = Controller::new(
        app_config(),
        Arc::new(MemoryTeamStore::new()),
        Arc::new(OfflineDriver),
        plugins,
        tx,
    );
    (Arc::new(controller), rx)
}
