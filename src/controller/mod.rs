//! Top-level context shared by the bootstrapper, the lifecycle controller,
//! plugins and the admin API.

use std::sync::Arc;

use crate::config::SlackAppConfig;
use crate::events::EventSender;
use crate::gateway::GatewayDriver;
use crate::hooks::PluginSet;
use crate::registry::ConnectedTeams;
use crate::storage::TeamStore;

pub struct Controller {
    app: SlackAppConfig,
    teams: Arc<ConnectedTeams>,
    store: Arc<dyn TeamStore>,
    driver: Arc<dyn GatewayDriver>,
    plugins: Arc<PluginSet>,
    events: EventSender,
}

impl Controller {
    pub fn new(
        app: SlackAppConfig,
        store: Arc<dyn TeamStore>,
        driver: Arc<dyn GatewayDriver>,
        plugins: PluginSet,
        events: EventSender,
    ) -> Self {
        Self {
            app,
            teams: Arc::new(ConnectedTeams::new()),
            store,
            driver,
            plugins: Arc::new(plugins),
            events,
        }
    }

    pub fn app(&self) -> &SlackAppConfig {
        &self.app
    }

    /// Registry of teams with a live session
    pub fn teams(&self) -> &Arc<ConnectedTeams> {
        &self.teams
    }

    pub fn store(&self) -> &Arc<dyn TeamStore> {
        &self.store
    }

    pub fn driver(&self) -> &Arc<dyn GatewayDriver> {
        &self.driver
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    /// Sender for publishing lifecycle events (install flow, admin API)
    pub fn events(&self) -> &EventSender {
        &self.events
    }
}

#[cfg(test)]
pub(crate) mod testing;
