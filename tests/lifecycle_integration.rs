//! End-to-end behaviour of the connection lifecycle against a scripted
//! gateway driver and the in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Notify};

use ara_team_connector::config::{ConnectorConfig, SlackAppConfig};
use ara_team_connector::connector::{self, StartMode};
use ara_team_connector::controller::Controller;
use ara_team_connector::events::{self, BotCreated, GatewayEvent, ReconnectFailed, Reconnected};
use ara_team_connector::gateway::{BotConnection, BotHandle, ConnectError, GatewayDriver};
use ara_team_connector::hooks::{BotPlugin, HookDispatcher, PluginSet};
use ara_team_connector::lifecycle::{
    run_attempt, AttemptOutcome, AttemptPath, Bootstrapper, EventOutcome, LifecycleController,
};
use ara_team_connector::storage::{MemoryTeamStore, SaveOutcome, StorageError, TeamStore};
use ara_team_connector::team::{BotCredentials, TeamRecord};

// ============================================================================
// Scripted gateway driver
// ============================================================================

#[derive(Clone)]
enum Script {
    Connect,
    Fail(ConnectError),
    /// Connect after `delay`
    Slow(Duration),
    /// Hand the opened connection to the test and wait for `proceed`
    Gated {
        opened: mpsc::UnboundedSender<BotConnection>,
        proceed: Arc<Notify>,
    },
}

#[derive(Default)]
struct DriverState {
    scripts: Mutex<HashMap<String, Script>>,
    attempts: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
struct ScriptedDriver {
    state: Arc<DriverState>,
}

impl ScriptedDriver {
    fn script(&self, team_id: &str, script: Script) {
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(team_id.to_string(), script);
    }

    fn attempts(&self) -> Vec<String> {
        let mut attempts = self.state.attempts.lock().unwrap().clone();
        attempts.sort();
        attempts
    }
}

struct ScriptedBot {
    team_id: String,
    state: Arc<DriverState>,
}

#[async_trait]
impl BotHandle for ScriptedBot {
    fn team_id(&self) -> &str {
        &self.team_id
    }

    async fn connect(&self) -> Result<BotConnection, ConnectError> {
        self.state.attempts.lock().unwrap().push(self.team_id.clone());
        let script = self
            .state
            .scripts
            .lock()
            .unwrap()
            .get(&self.team_id)
            .cloned()
            .unwrap_or(Script::Connect);

        let connection = BotConnection::for_team(&self.team_id, "B1", "ara-bot");
        match script {
            Script::Connect => Ok(connection),
            Script::Fail(e) => Err(e),
            Script::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(connection)
            }
            Script::Gated { opened, proceed } => {
                opened.send(connection.clone()).unwrap();
                proceed.notified().await;
                Ok(connection)
            }
        }
    }
}

impl GatewayDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn spawn(&self, team: &TeamRecord) -> Box<dyn BotHandle> {
        Box::new(ScriptedBot {
            team_id: team.id.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Store that cannot be reached at all
struct UnreachableStore;

#[async_trait]
impl TeamStore for UnreachableStore {
    fn backend_type(&self) -> &'static str {
        "unreachable"
    }

    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _team_id: &str) -> Result<Option<TeamRecord>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn save(&self, _team: &TeamRecord) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

/// Store that reads fine but rejects every write
struct ReadOnlyStore(MemoryTeamStore);

#[async_trait]
impl TeamStore for ReadOnlyStore {
    fn backend_type(&self) -> &'static str {
        "read-only"
    }

    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError> {
        self.0.all().await
    }

    async fn get(&self, team_id: &str) -> Result<Option<TeamRecord>, StorageError> {
        self.0.get(team_id).await
    }

    async fn save(&self, _team: &TeamRecord) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read-only replica".into()))
    }
}

// ============================================================================
// Plugins
// ============================================================================

type HookLog = Arc<Mutex<Vec<String>>>;

struct RecordingPlugin {
    name: &'static str,
    log: HookLog,
}

#[async_trait]
impl BotPlugin for RecordingPlugin {
    fn name(&self) -> &str {
        self.name
    }

    async fn initialize(
        &self,
        _controller: &Controller,
        _bot: Option<&BotConnection>,
    ) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("{}:init", self.name));
        Ok(())
    }

    async fn on_bot_connected(
        &self,
        _controller: &Controller,
        connection: &BotConnection,
    ) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, connection.team_id()));
        Ok(())
    }

    async fn on_tick(&self, _controller: &Controller) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("{}:tick", self.name));
        Ok(())
    }
}

struct FailingPlugin;

#[async_trait]
impl BotPlugin for FailingPlugin {
    fn name(&self) -> &str {
        "failing"
    }

    async fn on_bot_connected(
        &self,
        _controller: &Controller,
        _connection: &BotConnection,
    ) -> anyhow::Result<()> {
        anyhow::bail!("webhook endpoint returned 500")
    }
}

struct PanickingPlugin;

#[async_trait]
impl BotPlugin for PanickingPlugin {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn on_bot_connected(
        &self,
        _controller: &Controller,
        _connection: &BotConnection,
    ) -> anyhow::Result<()> {
        panic!("plugin bug")
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn app_config() -> SlackAppConfig {
    SlackAppConfig {
        client_id: "123.456".into(),
        client_secret: "secret".into(),
        redirect_uri: Some("https://example.com/oauth".into()),
        state: Some("state".into()),
        scopes: vec!["bot".into()],
        api_base_url: "http://127.0.0.1:9".into(),
    }
}

fn installed(id: &str) -> TeamRecord {
    TeamRecord::new(id).with_bot(BotCredentials::new(format!("xoxb-{}", id), "U1"))
}

struct Harness {
    controller: Arc<Controller>,
    driver: ScriptedDriver,
    events: events::EventReceiver,
}

fn harness_with(store: Arc<dyn TeamStore>, plugins: Vec<Arc<dyn BotPlugin>>) -> Harness {
    let driver = ScriptedDriver::default();
    let (tx, rx) = events::channel();
    let controller = Arc::new(Controller::new(
        app_config(),
        store,
        Arc::new(driver.clone()),
        PluginSet::new(plugins),
        tx,
    ));
    Harness {
        controller,
        driver,
        events: rx,
    }
}

fn harness(teams: Vec<TeamRecord>) -> Harness {
    harness_with(Arc::new(MemoryTeamStore::with_teams(teams)), Vec::new())
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn expect_attempt(outcome: EventOutcome) -> AttemptOutcome {
    match outcome {
        EventOutcome::AttemptSpawned(handle) => handle.await.unwrap(),
        other => panic!("expected an attempt, got {:?}", other),
    }
}

fn bot_created(team: TeamRecord) -> GatewayEvent {
    GatewayEvent::BotCreated(BotCreated { team })
}

fn reconnect_failed(connection: BotConnection) -> GatewayEvent {
    GatewayEvent::ReconnectFailed(ReconnectFailed {
        connection,
        error: ConnectError::ReconnectExhausted {
            attempts: 10,
            last_error: "connection reset".into(),
        },
    })
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_bootstrap_only_attempts_teams_with_credentials() {
    let h = harness(vec![installed("T1"), TeamRecord::new("T2")]);

    let handle = Bootstrapper::new(Arc::clone(&h.controller)).run().await.unwrap();
    assert_eq!(handle.attempted(), ["T1".to_string()]);
    assert_eq!(handle.skipped(), ["T2".to_string()]);

    let report = handle.wait().await;
    assert_eq!(report.connected, 1);
    assert_eq!(report.skipped, 1);

    assert_eq!(h.driver.attempts(), vec!["T1"]);
    assert!(h.controller.teams().contains("T1"));
    assert!(!h.controller.teams().contains("T2"));
}

#[tokio::test]
async fn test_bootstrap_purges_only_revoked_credentials() {
    let store = Arc::new(MemoryTeamStore::with_teams([
        installed("T1"),
        installed("T2"),
        installed("T3"),
        installed("T4"),
    ]));
    let h = harness_with(store.clone(), Vec::new());
    h.driver.script("T1", Script::Fail(ConnectError::from_api_code("invalid_auth")));
    h.driver.script("T2", Script::Fail(ConnectError::from_api_code("account_inactive")));
    h.driver.script("T3", Script::Fail(ConnectError::Transport("timed out".into())));
    h.driver.script("T4", Script::Fail(ConnectError::from_api_code("ratelimited")));

    let report = Bootstrapper::new(Arc::clone(&h.controller))
        .run()
        .await
        .unwrap()
        .wait()
        .await;

    assert_eq!(report.revoked, vec!["T1", "T2"]);
    assert_eq!(report.failed, vec!["T3", "T4"]);
    assert_eq!(report.connected, 0);

    assert!(!store.get("T1").await.unwrap().unwrap().has_credentials());
    assert!(!store.get("T2").await.unwrap().unwrap().has_credentials());
    assert_eq!(store.get("T3").await.unwrap().unwrap(), installed("T3"));
    assert_eq!(store.get("T4").await.unwrap().unwrap(), installed("T4"));
    assert!(h.controller.teams().is_empty());
}

#[tokio::test]
async fn test_purge_keeps_other_team_fields() {
    let team = installed("T1").with_metadata("name", "Acme");
    let store = Arc::new(MemoryTeamStore::with_teams([team]));
    let h = harness_with(store.clone(), Vec::new());
    h.driver.script("T1", Script::Fail(ConnectError::from_api_code("invalid_auth")));

    Bootstrapper::new(Arc::clone(&h.controller))
        .run()
        .await
        .unwrap()
        .wait()
        .await;

    let stored = store.get("T1").await.unwrap().unwrap();
    assert!(stored.bot.is_none());
    assert_eq!(stored.name(), Some("Acme"));
}

#[tokio::test]
async fn test_purge_save_failure_is_swallowed() {
    let store = Arc::new(ReadOnlyStore(MemoryTeamStore::with_teams([installed("T1")])));
    let h = harness_with(store.clone(), Vec::new());
    h.driver.script("T1", Script::Fail(ConnectError::from_api_code("account_inactive")));

    let claim = h.controller.teams().begin_connect("T1").unwrap();
    let outcome = run_attempt(&h.controller, installed("T1"), AttemptPath::Bootstrap, claim).await;

    match outcome {
        AttemptOutcome::AuthRevoked {
            purge: Some(SaveOutcome::Dropped { reason }),
            ..
        } => assert!(reason.contains("read-only replica")),
        other => panic!("expected a dropped purge, got {:?}", other),
    }
    // Nothing was written, and the claim was released
    assert!(store.get("T1").await.unwrap().unwrap().has_credentials());
    assert!(!h.controller.teams().is_connecting("T1"));
}

#[tokio::test]
async fn test_bootstrap_load_failure_is_fatal() {
    let h = harness_with(Arc::new(UnreachableStore), Vec::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let result = connector::start(
        Arc::clone(&h.controller),
        &ConnectorConfig::default(),
        h.events,
        &shutdown_tx,
    )
    .await;

    let err = match result {
        Err(StorageError::Unavailable(msg)) => {
            assert_eq!(msg, "connection refused");
            StorageError::Unavailable(msg)
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("bootstrap must fail when teams cannot be loaded"),
    };
    assert!(h.driver.attempts().is_empty());

    // The binary returns this from main, keeping the cause for the exit report
    let fatal: anyhow::Error = err.into();
    assert!(fatal.to_string().contains("connection refused"));
}

// ============================================================================
// BotCreated
// ============================================================================

#[tokio::test]
async fn test_bot_created_twice_connects_once() {
    let h = harness(Vec::new());
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let first = expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await;
    assert!(first.is_connected());

    let second = lifecycle.handle(bot_created(installed("T1"))).await;
    assert!(matches!(second, EventOutcome::AlreadyConnected));

    assert_eq!(h.driver.attempts(), vec!["T1"]);
    assert_eq!(h.controller.teams().len(), 1);
}

#[tokio::test]
async fn test_bot_created_while_connecting_is_ignored() {
    let h = harness(Vec::new());
    h.driver.script("T1", Script::Slow(Duration::from_millis(50)));
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let first = lifecycle.handle(bot_created(installed("T1"))).await;
    let second = lifecycle.handle(bot_created(installed("T1"))).await;
    assert!(matches!(second, EventOutcome::AttemptInFlight));

    assert!(expect_attempt(first).await.is_connected());
    assert_eq!(h.driver.attempts(), vec!["T1"]);
    assert_eq!(h.controller.teams().len(), 1);
}

#[tokio::test]
async fn test_bot_created_revoked_keeps_credentials() {
    let store = Arc::new(MemoryTeamStore::with_teams([installed("T1")]));
    let h = harness_with(store.clone(), Vec::new());
    h.driver.script("T1", Script::Fail(ConnectError::from_api_code("invalid_auth")));
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let outcome = expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await;

    assert!(matches!(outcome, AttemptOutcome::AuthRevoked { purge: None, .. }));
    assert!(store.get("T1").await.unwrap().unwrap().has_credentials());
    assert!(!h.controller.teams().contains("T1"));
}

#[tokio::test]
async fn test_bot_created_after_failure_can_retry() {
    let h = harness(Vec::new());
    h.driver.script("T1", Script::Fail(ConnectError::Transport("dns".into())));
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let failed = expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await;
    assert!(matches!(failed, AttemptOutcome::Failed(ConnectError::Transport(_))));

    h.driver.script("T1", Script::Connect);
    let retried = expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await;
    assert!(retried.is_connected());
    assert_eq!(h.driver.attempts(), vec!["T1", "T1"]);
}

// ============================================================================
// ReconnectFailed
// ============================================================================

#[tokio::test]
async fn test_reconnect_failed_removes_team() {
    let store = Arc::new(MemoryTeamStore::with_teams([installed("T1")]));
    let h = harness_with(store.clone(), Vec::new());
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let connection = match expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await {
        AttemptOutcome::Connected(connection) => connection,
        other => panic!("expected connection, got {:?}", other),
    };

    match lifecycle.handle(reconnect_failed(connection.clone())).await {
        EventOutcome::Removed(Some(entry)) => assert_eq!(entry.session_id, connection.session_id),
        other => panic!("expected removal, got {:?}", other),
    }
    assert!(!h.controller.teams().contains("T1"));
    // Credentials are untouched
    assert!(store.get("T1").await.unwrap().unwrap().has_credentials());
}

#[tokio::test]
async fn test_reconnect_failed_for_absent_team_is_noop() {
    let h = harness(Vec::new());
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let outcome = lifecycle
        .handle(reconnect_failed(BotConnection::for_team("T9", "B1", "bot")))
        .await;

    assert!(matches!(outcome, EventOutcome::Removed(None)));
    assert!(h.controller.teams().is_empty());
    // Nothing in flight, so nothing is kept for the session
    assert_eq!(h.controller.teams().retired_count(), 0);
}

#[tokio::test]
async fn test_reconnect_failed_before_registration_wins() {
    let h = harness(Vec::new());
    let (opened_tx, mut opened_rx) = mpsc::unbounded_channel();
    let proceed = Arc::new(Notify::new());
    h.driver.script(
        "T1",
        Script::Gated {
            opened: opened_tx,
            proceed: Arc::clone(&proceed),
        },
    );
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let attempt = lifecycle.handle(bot_created(installed("T1"))).await;
    let connection = opened_rx.recv().await.unwrap();

    // The session dies before the attempt gets to register it
    let removed = lifecycle.handle(reconnect_failed(connection)).await;
    assert!(matches!(removed, EventOutcome::Removed(None)));
    proceed.notify_one();

    let outcome = expect_attempt(attempt).await;
    assert!(matches!(outcome, AttemptOutcome::Superseded(_)));
    assert!(!h.controller.teams().contains("T1"));
    assert_eq!(h.controller.teams().retired_count(), 0);

    // A fresh install afterwards connects normally
    h.driver.script("T1", Script::Connect);
    let retried = expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await;
    assert!(retried.is_connected());
    assert!(h.controller.teams().contains("T1"));
}

// ============================================================================
// Hooks
// ============================================================================

#[tokio::test]
async fn test_connected_hooks_run_in_order_despite_failures() {
    let log = HookLog::default();
    let plugins: Vec<Arc<dyn BotPlugin>> = vec![
        Arc::new(RecordingPlugin { name: "first", log: log.clone() }),
        Arc::new(FailingPlugin),
        Arc::new(PanickingPlugin),
        Arc::new(RecordingPlugin { name: "last", log: log.clone() }),
    ];
    let h = harness_with(
        Arc::new(MemoryTeamStore::with_teams([installed("T1"), installed("T2")])),
        plugins,
    );

    Bootstrapper::new(Arc::clone(&h.controller))
        .run()
        .await
        .unwrap()
        .wait()
        .await;

    let entries = log.lock().unwrap().clone();
    for team in ["T1", "T2"] {
        let first = entries.iter().position(|e| *e == format!("first:{}", team)).unwrap();
        let last = entries.iter().position(|e| *e == format!("last:{}", team)).unwrap();
        assert!(first < last);
    }
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn test_reconnected_session_fires_hooks_again() {
    let log = HookLog::default();
    let plugins: Vec<Arc<dyn BotPlugin>> = vec![
        Arc::new(RecordingPlugin { name: "first", log: log.clone() }),
        Arc::new(FailingPlugin),
        Arc::new(RecordingPlugin { name: "last", log: log.clone() }),
    ];
    let h = harness_with(Arc::new(MemoryTeamStore::new()), plugins);
    let lifecycle = LifecycleController::new(Arc::clone(&h.controller));

    let connection = match expect_attempt(lifecycle.handle(bot_created(installed("T1"))).await).await {
        AttemptOutcome::Connected(connection) => connection,
        other => panic!("expected connection, got {:?}", other),
    };

    let outcome = lifecycle
        .handle(GatewayEvent::Reconnected(Reconnected { connection }))
        .await;
    match outcome {
        EventOutcome::HooksDispatched(report) => {
            assert_eq!(report.invoked, vec!["first", "failing", "last"]);
            assert_eq!(report.failed, vec!["failing"]);
        }
        other => panic!("expected hooks, got {:?}", other),
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:T1", "last:T1", "first:T1", "last:T1"]
    );

    // Sessions that are no longer registered do not fire hooks
    let stale = BotConnection::for_team("T7", "B1", "bot");
    let outcome = lifecycle
        .handle(GatewayEvent::Reconnected(Reconnected { connection: stale }))
        .await;
    assert!(matches!(outcome, EventOutcome::Ignored));
}

#[tokio::test]
async fn test_plugins_initialize_once_before_connecting() {
    let log = HookLog::default();
    let plugins: Vec<Arc<dyn BotPlugin>> =
        vec![Arc::new(RecordingPlugin { name: "rec", log: log.clone() })];
    let h = harness_with(Arc::new(MemoryTeamStore::with_teams([installed("T1")])), plugins);
    let (shutdown_tx, _) = broadcast::channel(1);

    let mode = connector::start(
        Arc::clone(&h.controller),
        &ConnectorConfig::default(),
        h.events,
        &shutdown_tx,
    )
    .await
    .unwrap();

    let StartMode::Live { bootstrap, lifecycle } = mode else {
        panic!("start_rtm defaults to live mode");
    };
    bootstrap.wait().await;
    assert_eq!(*log.lock().unwrap(), vec!["rec:init", "rec:T1"]);

    let again = HookDispatcher::initialize(h.controller.plugins(), &h.controller, None).await;
    assert!(again.invoked.is_empty());
    assert_eq!(log.lock().unwrap().len(), 2);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), lifecycle)
        .await
        .unwrap()
        .unwrap();
}

// ============================================================================
// Startup modes
// ============================================================================

#[tokio::test]
async fn test_passive_mode_ticks_without_connecting() {
    let log = HookLog::default();
    let plugins: Vec<Arc<dyn BotPlugin>> =
        vec![Arc::new(RecordingPlugin { name: "rec", log: log.clone() })];
    let h = harness_with(Arc::new(MemoryTeamStore::with_teams([installed("T1")])), plugins);
    let (shutdown_tx, _) = broadcast::channel(1);
    let config = ConnectorConfig {
        start_rtm: false,
        tick_interval_ms: 10,
        ..ConnectorConfig::default()
    };

    let mode = connector::start(Arc::clone(&h.controller), &config, h.events, &shutdown_tx)
        .await
        .unwrap();
    assert!(!mode.is_live());

    wait_until(|| log.lock().unwrap().iter().any(|e| e == "rec:tick")).await;
    assert!(h.driver.attempts().is_empty());
    assert!(h.controller.teams().is_empty());

    let StartMode::Ticking { ticker } = mode else {
        unreachable!()
    };
    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), ticker)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_live_mode_consumes_published_events() {
    let store = Arc::new(MemoryTeamStore::new());
    let h = harness_with(store.clone(), Vec::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let mode = connector::start(
        Arc::clone(&h.controller),
        &ConnectorConfig::default(),
        h.events,
        &shutdown_tx,
    )
    .await
    .unwrap();
    assert!(mode.is_live());

    // The install flow stores the team, then announces it
    tokio_test::assert_ok!(store.save(&installed("T1")).await);
    tokio_test::assert_ok!(h.controller.events().bot_created(installed("T1")));

    let teams = Arc::clone(h.controller.teams());
    wait_until(|| teams.contains("T1")).await;
    assert_eq!(h.driver.attempts(), vec!["T1"]);

    let connection = h.controller.teams().snapshot()[0].clone();
    let failed = BotConnection {
        session_id: connection.session_id,
        ..BotConnection::for_team("T1", "B1", "ara-bot")
    };
    tokio_test::assert_ok!(h.controller.events().reconnect_failed(
        failed,
        ConnectError::ReconnectExhausted {
            attempts: 3,
            last_error: "closed".into(),
        },
    ));
    wait_until(|| !teams.contains("T1")).await;

    let StartMode::Live { lifecycle, .. } = mode else {
        unreachable!()
    };
    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), lifecycle)
        .await
        .unwrap()
        .unwrap();
}
