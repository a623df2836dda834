//! Startup wiring of the connector.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ConnectorConfig;
use crate::controller::Controller;
use crate::events::EventReceiver;
use crate::hooks::HookDispatcher;
use crate::lifecycle::{BootstrapHandle, Bootstrapper, LifecycleController};
use crate::storage::StorageError;
use crate::tasks::TickTask;

/// How the connector was started
pub enum StartMode {
    /// Stored teams are being reconnected and lifecycle events are handled
    Live {
        bootstrap: BootstrapHandle,
        lifecycle: JoinHandle<()>,
    },
    /// No sessions are opened; plugins are only ticked
    Ticking { ticker: JoinHandle<()> },
}

impl StartMode {
    pub fn is_live(&self) -> bool {
        matches!(self, StartMode::Live { .. })
    }
}

/// Initialize plugins, then either reconnect every stored team and start
/// consuming lifecycle events, or fall back to passive ticking.
///
/// An error means the stored teams could not be loaded; the caller is
/// expected to treat it as fatal.
pub async fn start(
    controller: Arc<Controller>,
    config: &ConnectorConfig,
    events: EventReceiver,
    shutdown: &broadcast::Sender<()>,
) -> Result<StartMode, StorageError> {
    let app = controller.app();
    tracing::info!(
        client_id = %app.client_id,
        redirect_uri = ?app.redirect_uri,
        scopes = ?app.scopes,
        start_rtm = config.start_rtm,
        plugins = ?controller.plugins().names(),
        "Configuring Slack app"
    );

    HookDispatcher::initialize(controller.plugins(), &controller, None).await;

    if !config.start_rtm {
        tracing::info!("RTM disabled, starting passive ticking");
        let task = TickTask::new(
            Arc::clone(&controller),
            Duration::from_millis(config.tick_interval_ms),
            shutdown.subscribe(),
        );
        return Ok(StartMode::Ticking {
            ticker: tokio::spawn(task.run()),
        });
    }

    let bootstrap = Bootstrapper::new(Arc::clone(&controller)).run().await?;
    let lifecycle = LifecycleController::new(controller);
    let lifecycle = tokio::spawn(lifecycle.run(events, shutdown.subscribe()));

    Ok(StartMode::Live {
        bootstrap,
        lifecycle,
    })
}
