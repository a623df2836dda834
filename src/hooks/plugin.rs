use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::controller::Controller;
use crate::gateway::BotConnection;

/// An extension that reacts to connector lifecycle hooks.
///
/// Every hook is optional. Errors are logged by the dispatcher and never
/// stop other plugins from running.
#[async_trait]
pub trait BotPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called once at startup, before any connection attempt
    async fn initialize(
        &self,
        _controller: &Controller,
        _bot: Option<&BotConnection>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after every successful connection or reconnection
    async fn on_bot_connected(
        &self,
        _controller: &Controller,
        _connection: &BotConnection,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on every tick in passive mode
    async fn on_tick(&self, _controller: &Controller) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ordered plugin collection; dispatch follows registration order
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Arc<dyn BotPlugin>>,
    initialized: AtomicBool,
}

impl PluginSet {
    pub fn new(plugins: Vec<Arc<dyn BotPlugin>>) -> Self {
        Self {
            plugins,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn BotPlugin>> {
        self.plugins.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Flip the set to initialized; returns false if it already was
    pub(crate) fn mark_initialized(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }
}

impl FromIterator<Arc<dyn BotPlugin>> for PluginSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn BotPlugin>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
