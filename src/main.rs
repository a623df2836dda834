use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use ara_team_connector::config::Settings;
use ara_team_connector::connector::{self, StartMode};
use ara_team_connector::controller::Controller;
use ara_team_connector::events;
use ara_team_connector::gateway::SlackRtmDriver;
use ara_team_connector::hooks::resolve_plugins;
use ara_team_connector::infrastructure::postgres::PostgresPool;
use ara_team_connector::infrastructure::redis::RedisPool;
use ara_team_connector::infrastructure::CircuitBreaker;
use ara_team_connector::server::{create_app, AppState};
use ara_team_connector::shutdown::GracefulShutdown;
use ara_team_connector::storage::{create_team_store, PostgresTeamStore, TeamStore};
use ara_team_connector::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let (events_tx, events_rx) = events::channel();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    // Storage
    let breaker = Arc::new(CircuitBreaker::new(
        "storage",
        settings.storage.circuit_breaker.clone(),
    ));
    let store = create_store(&settings, Arc::clone(&breaker)).await?;

    // Gateway driver and plugins
    let driver = Arc::new(SlackRtmDriver::new(
        settings.slack_driver_config(),
        events_tx.clone(),
        shutdown_tx.clone(),
    ));
    let plugins = resolve_plugins(&settings.connector.plugins)?;

    let controller = Arc::new(Controller::new(
        settings.slack.clone(),
        store,
        driver,
        plugins,
        events_tx,
    ));

    let mut shutdown = GracefulShutdown::new(Arc::clone(&controller), shutdown_tx.clone());

    match connector::start(
        Arc::clone(&controller),
        &settings.connector,
        events_rx,
        &shutdown_tx,
    )
    .await
    {
        Ok(StartMode::Live {
            bootstrap,
            lifecycle,
        }) => {
            shutdown.track("lifecycle", lifecycle);
            tokio::spawn(async move {
                let report = bootstrap.wait().await;
                tracing::info!(
                    connected = report.connected,
                    revoked = report.revoked.len(),
                    failed = report.failed.len(),
                    skipped = report.skipped,
                    "Bootstrap finished"
                );
            });
        }
        Ok(StartMode::Ticking { ticker }) => shutdown.track("ticker", ticker),
        Err(e) => {
            tracing::error!(error = %e, "Could not reconnect teams");
            // Dropping the telemetry guard on return flushes pending spans
            return Err(e.into());
        }
    }

    let mut state = AppState::new(Arc::clone(&controller), settings.connector.start_rtm)
        .with_api_key(settings.server.api_key.clone());
    if settings.storage.backend != "memory" {
        state = state.with_storage_breaker(breaker);
    }
    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Admin API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.execute("server shutdown").await;
    tracing::info!("Connector shutdown complete");
    Ok(())
}

async fn create_store(
    settings: &Settings,
    breaker: Arc<CircuitBreaker>,
) -> Result<Arc<dyn TeamStore>> {
    match settings.storage.backend.as_str() {
        "redis" => {
            let pool = Arc::new(RedisPool::new(&settings.redis, breaker)?);
            Ok(create_team_store(&settings.storage, Some(pool), None))
        }
        "postgres" => {
            let pool = PostgresPool::new(&settings.database, breaker).await?;
            PostgresTeamStore::new(pool.clone()).ensure_schema().await?;
            Ok(create_team_store(&settings.storage, None, Some(pool)))
        }
        _ => Ok(create_team_store(&settings.storage, None, None)),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
