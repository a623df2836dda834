//! Hook dispatch with per-plugin failure isolation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;

use crate::controller::Controller;
use crate::gateway::BotConnection;
use crate::metrics::HookMetrics;

use super::plugin::{BotPlugin, PluginSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Initialize,
    BotConnected,
    Tick,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Initialize => "initialize",
            Hook::BotConnected => "bot_connected",
            Hook::Tick => "tick",
        }
    }
}

/// Result of dispatching one hook to every plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub hook: Hook,
    /// Plugins invoked, in order
    pub invoked: Vec<String>,
    /// Plugins whose hook returned an error or panicked
    pub failed: Vec<String>,
}

impl DispatchReport {
    fn empty(hook: Hook) -> Self {
        Self {
            hook,
            invoked: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct HookDispatcher;

impl HookDispatcher {
    /// Run every plugin's `initialize` hook. Only the first call for a set
    /// dispatches; later calls return an empty report.
    pub async fn initialize(
        plugins: &PluginSet,
        controller: &Controller,
        bot: Option<&BotConnection>,
    ) -> DispatchReport {
        if !plugins.mark_initialized() {
            tracing::warn!("Plugins already initialized, skipping");
            return DispatchReport::empty(Hook::Initialize);
        }

        let report = dispatch(plugins, Hook::Initialize, |plugin| {
            plugin.initialize(controller, bot)
        })
        .await;

        tracing::info!(
            plugins = ?report.invoked,
            failed = report.failed.len(),
            "Plugins initialized"
        );
        report
    }

    /// Run every plugin's `on_bot_connected` hook for a live session
    #[tracing::instrument(
        name = "hooks.bot_connected",
        skip_all,
        fields(team_id = %connection.team_id(), session_id = %connection.session_id)
    )]
    pub async fn bot_connected(
        plugins: &PluginSet,
        controller: &Controller,
        connection: &BotConnection,
    ) -> DispatchReport {
        dispatch(plugins, Hook::BotConnected, |plugin| {
            plugin.on_bot_connected(controller, connection)
        })
        .await
    }

    pub async fn tick(plugins: &PluginSet, controller: &Controller) -> DispatchReport {
        dispatch(plugins, Hook::Tick, |plugin| plugin.on_tick(controller)).await
    }
}

async fn dispatch<'a, F>(plugins: &'a PluginSet, hook: Hook, call: F) -> DispatchReport
where
    F: Fn(&'a dyn BotPlugin) -> BoxFuture<'a, anyhow::Result<()>>,
{
    let start = Instant::now();
    let mut report = DispatchReport::empty(hook);

    for plugin in plugins.iter() {
        let name = plugin.name().to_string();

        match AssertUnwindSafe(call(plugin.as_ref())).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(
                    plugin = %name,
                    hook = hook.as_str(),
                    error = %e,
                    "Plugin hook failed"
                );
                HookMetrics::record_failure(&name, hook.as_str());
                report.failed.push(name.clone());
            }
            Err(panic) => {
                tracing::error!(
                    plugin = %name,
                    hook = hook.as_str(),
                    panic = %panic_message(panic.as_ref()),
                    "Plugin hook panicked"
                );
                HookMetrics::record_failure(&name, hook.as_str());
                report.failed.push(name.clone());
            }
        }

        report.invoked.push(name);
    }

    HookMetrics::record_dispatch(hook.as_str(), start.elapsed());
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
