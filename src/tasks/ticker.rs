use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::controller::Controller;
use crate::hooks::HookDispatcher;

/// Background task driving plugin `on_tick` hooks when no live sessions
/// are kept
pub struct TickTask {
    controller: Arc<Controller>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl TickTask {
    pub fn new(
        controller: Arc<Controller>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            controller,
            // tokio intervals cannot have a zero period
            interval: interval.max(Duration::from_millis(1)),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(self.interval);
        // Skip immediate first tick
        timer.tick().await;

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            plugins = self.controller.plugins().len(),
            "Tick task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Tick task received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    HookDispatcher::tick(self.controller.plugins(), &self.controller).await;
                }
            }
        }

        tracing::info!("Tick task stopped");
    }
}
