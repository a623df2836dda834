//! Graceful shutdown of the connector.
//!
//! 1. Signals background tasks (lifecycle controller, ticker, gateway
//!    sessions) through the shared broadcast channel
//! 2. Waits, bounded, for the tracked tasks to stop

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::controller::Controller;

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for background tasks to stop (default: 10 seconds)
    pub task_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(10),
        }
    }
}

pub struct GracefulShutdown {
    controller: Arc<Controller>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(controller: Arc<Controller>, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self::with_config(controller, shutdown_tx, ShutdownConfig::default())
    }

    pub fn with_config(
        controller: Arc<Controller>,
        shutdown_tx: broadcast::Sender<()>,
        config: ShutdownConfig,
    ) -> Self {
        Self {
            controller,
            shutdown_tx,
            tasks: Vec::new(),
            config,
        }
    }

    /// Track a background task to wait for during shutdown
    pub fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.tasks.push((name, handle));
    }

    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(connected_teams = self.controller.teams().len())
    )]
    pub async fn execute(self, reason: &str) -> ShutdownResult {
        let start = Instant::now();
        let mut result = ShutdownResult {
            connected_teams: self.controller.teams().len(),
            ..ShutdownResult::default()
        };

        tracing::info!(
            reason = %reason,
            "Starting graceful shutdown - Phase 1: Signaling background tasks"
        );
        // No receivers left just means nothing is running
        let _ = self.shutdown_tx.send(());

        tracing::info!(tasks = self.tasks.len(), "Phase 2: Waiting for background tasks");
        let total = self.tasks.len();
        let mut pending: FuturesUnordered<_> = self
            .tasks
            .into_iter()
            .map(|(name, handle)| async move { (name, handle.await) })
            .collect();

        let mut stopped = 0;
        let wait = async {
            while let Some((name, joined)) = pending.next().await {
                match joined {
                    Ok(()) => tracing::debug!(task = name, "Background task stopped"),
                    Err(e) => {
                        tracing::warn!(task = name, error = %e, "Background task ended abnormally")
                    }
                }
                stopped += 1;
            }
        };
        let finished = timeout(self.config.task_timeout, wait).await.is_ok();

        result.tasks_stopped = stopped;
        result.tasks_timed_out = total - stopped;
        if !finished {
            tracing::warn!(
                remaining = result.tasks_timed_out,
                "Background tasks did not stop in time"
            );
        }

        result.duration = start.elapsed();
        result.success = result.tasks_timed_out == 0;

        tracing::info!(
            tasks_stopped = result.tasks_stopped,
            tasks_timed_out = result.tasks_timed_out,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }
}

#[derive(Debug, Default)]
pub struct ShutdownResult {
    /// Whether every tracked task stopped in time
    pub success: bool,
    /// Teams registered when shutdown began
    pub connected_teams: usize,
    pub tasks_stopped: usize,
    pub tasks_timed_out: usize,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing;
    use crate::hooks::PluginSet;

    #[tokio::test]
    async fn test_shutdown_without_tasks() {
        let (controller, _rx) = testing::controller(PluginSet::default());
        let (tx, _) = broadcast::channel(1);

        let result = GracefulShutdown::new(controller, tx).execute("test shutdown").await;

        assert!(result.success);
        assert_eq!(result.tasks_stopped, 0);
        assert_eq!(result.connected_teams, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_listening_tasks() {
        let (controller, _rx) = testing::controller(PluginSet::default());
        let (tx, _) = broadcast::channel(1);

        let mut shutdown = GracefulShutdown::new(controller, tx.clone());
        for name in ["first", "second"] {
            let mut rx = tx.subscribe();
            let handle = tokio::spawn(async move {
                let _ = rx.recv().await;
            });
            shutdown.track(name, handle);
        }

        let result = shutdown.execute("test shutdown").await;
        assert!(result.success);
        assert_eq!(result.tasks_stopped, 2);
    }

    #[tokio::test]
    async fn test_shutdown_times_out_stuck_task() {
        let (controller, _rx) = testing::controller(PluginSet::default());
        let (tx, _) = broadcast::channel(1);
        let config = ShutdownConfig {
            task_timeout: Duration::from_millis(50),
        };

        let mut shutdown = GracefulShutdown::with_config(controller, tx, config);
        shutdown.track("stuck", tokio::spawn(std::future::pending::<()>()));

        let result = shutdown.execute("test shutdown").await;
        assert!(!result.success);
        assert_eq!(result.tasks_timed_out, 1);
    }
}
