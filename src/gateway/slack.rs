//! Slack RTM gateway driver.
//!
//! Sessions are opened with `rtm.connect` and kept on a WebSocket. When the
//! socket drops (or Slack sends `goodbye`) the driver reconnects with
//! exponential backoff; a successful reconnection publishes `Reconnected`,
//! running out of attempts publishes `ReconnectFailed`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::events::EventSender;
use crate::team::TeamRecord;

use super::{
    BackoffConfig, BotConnection, BotHandle, BotIdentity, ConnectError, ExponentialBackoff,
    GatewayDriver, TeamInfo,
};

type RtmSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Slack driver settings
#[derive(Debug, Clone)]
pub struct SlackDriverConfig {
    /// Web API base, e.g. `https://slack.com/api`
    pub api_base_url: String,
    /// Interval between RTM pings
    pub ping_interval: Duration,
    /// Timeout for Web API requests
    pub request_timeout: Duration,
    pub reconnect: BackoffConfig,
}

impl Default for SlackDriverConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://slack.com/api".to_string(),
            ping_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            reconnect: BackoffConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RtmConnectResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "self")]
    bot: Option<RtmSelf>,
    #[serde(default)]
    team: Option<RtmTeam>,
}

#[derive(Debug, Deserialize)]
struct RtmSelf {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RtmTeam {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

/// Session started by `rtm.connect`, before the socket is opened
#[derive(Debug)]
struct RtmStart {
    url: String,
    team: TeamInfo,
    identity: BotIdentity,
}

impl RtmConnectResponse {
    /// The session always carries the stored team ID, whatever the gateway
    /// reports, so registry and events key on the same value.
    fn into_start(self, team_id: &str) -> Result<RtmStart, ConnectError> {
        if !self.ok {
            let code = self.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(ConnectError::from_api_code(&code));
        }

        let url = self
            .url
            .ok_or_else(|| ConnectError::Api("missing_rtm_url".to_string()))?;
        let bot = self
            .bot
            .ok_or_else(|| ConnectError::Api("missing_bot_identity".to_string()))?;
        let team = match self.team {
            Some(t) => {
                if t.id != team_id {
                    tracing::warn!(
                        team_id = %team_id,
                        gateway_team_id = %t.id,
                        "rtm.connect reported a different team ID"
                    );
                }
                TeamInfo {
                    id: team_id.to_string(),
                    name: t.name,
                    domain: t.domain,
                }
            }
            None => TeamInfo {
                id: team_id.to_string(),
                name: None,
                domain: None,
            },
        };

        Ok(RtmStart {
            url,
            team,
            identity: BotIdentity {
                id: bot.id,
                name: bot.name,
            },
        })
    }
}

/// Why a socket stopped being driven
#[derive(Debug)]
enum SocketEnd {
    Shutdown,
    Goodbye,
    Dropped(String),
}

struct DriverInner {
    http: reqwest::Client,
    config: SlackDriverConfig,
    events: EventSender,
    shutdown: broadcast::Sender<()>,
}

impl DriverInner {
    async fn rtm_connect(&self, token: &str, team_id: &str) -> Result<RtmStart, ConnectError> {
        let url = format!("{}/rtm.connect", self.config.api_base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let body: RtmConnectResponse = response
            .json()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        body.into_start(team_id)
    }

    async fn open_socket(&self, url: &str) -> Result<RtmSocket, ConnectError> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        Ok(socket)
    }

    async fn start(&self, token: &str, team_id: &str) -> Result<(RtmStart, RtmSocket), ConnectError> {
        let start = self.rtm_connect(token, team_id).await?;
        let socket = self.open_socket(&start.url).await?;
        Ok((start, socket))
    }
}

/// Gateway driver backed by the Slack RTM API
#[derive(Clone)]
pub struct SlackRtmDriver {
    inner: Arc<DriverInner>,
}

impl SlackRtmDriver {
    pub fn new(
        config: SlackDriverConfig,
        events: EventSender,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                http: reqwest::Client::new(),
                config,
                events,
                shutdown,
            }),
        }
    }
}

impl GatewayDriver for SlackRtmDriver {
    fn name(&self) -> &str {
        "slack-rtm"
    }

    fn spawn(&self, team: &TeamRecord) -> Box<dyn BotHandle> {
        Box::new(SlackBot {
            team: team.clone(),
            inner: Arc::clone(&self.inner),
        })
    }
}

struct SlackBot {
    team: TeamRecord,
    inner: Arc<DriverInner>,
}

#[async_trait]
impl BotHandle for SlackBot {
    fn team_id(&self) -> &str {
        &self.team.id
    }

    async fn connect(&self) -> Result<BotConnection, ConnectError> {
        let token = self
            .team
            .bot
            .as_ref()
            .map(|b| b.token.clone())
            .ok_or(ConnectError::MissingCredentials)?;

        let (start, socket) = self.inner.start(&token, &self.team.id).await?;
        let connection = BotConnection::new(start.team, start.identity);

        tracing::debug!(
            team_id = %connection.team_id(),
            session_id = %connection.session_id,
            "RTM socket opened"
        );

        tokio::spawn(run_session(
            Arc::clone(&self.inner),
            token,
            connection.clone(),
            socket,
        ));

        Ok(connection)
    }
}

/// Drive a session until shutdown or until reconnection is exhausted
async fn run_session(
    inner: Arc<DriverInner>,
    token: String,
    connection: BotConnection,
    mut socket: RtmSocket,
) {
    let mut shutdown = inner.shutdown.subscribe();
    let mut backoff = ExponentialBackoff::new(inner.config.reconnect.clone());

    loop {
        let reason = match drive_socket(&inner, &connection, socket, &mut shutdown).await {
            SocketEnd::Shutdown => return,
            SocketEnd::Goodbye => "server sent goodbye".to_string(),
            SocketEnd::Dropped(reason) => reason,
        };

        tracing::warn!(
            bot = %connection.identity(),
            reason = %reason,
            "RTM session dropped, reconnecting"
        );

        backoff.reset();
        let mut last_error = reason;

        socket = loop {
            let Some(delay) = backoff.next_delay() else {
                let error = ConnectError::ReconnectExhausted {
                    attempts: backoff.attempt(),
                    last_error,
                };
                let _ = inner.events.reconnect_failed(connection.clone(), error);
                return;
            };

            tokio::select! {
                _ = shutdown.recv() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            match inner.start(&token, connection.team_id()).await {
                Ok((_, socket)) => break socket,
                Err(e) if e.is_auth_revoked() => {
                    let _ = inner.events.reconnect_failed(connection.clone(), e);
                    return;
                }
                Err(e) => {
                    tracing::debug!(
                        bot = %connection.identity(),
                        attempt = backoff.attempt(),
                        error = %e,
                        "RTM reconnection attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        };

        let _ = inner.events.reconnected(connection.clone());
    }
}

async fn drive_socket(
    inner: &DriverInner,
    connection: &BotConnection,
    socket: RtmSocket,
    shutdown: &mut broadcast::Receiver<()>,
) -> SocketEnd {
    let (mut write, mut read) = socket.split();
    let mut ping_timer =
        tokio::time::interval(inner.config.ping_interval.max(Duration::from_secs(1)));
    let mut ping_id: u64 = 0;

    // Skip immediate first tick
    ping_timer.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                let _ = write.send(Message::Close(None)).await;
                return SocketEnd::Shutdown;
            }
            _ = ping_timer.tick() => {
                ping_id += 1;
                let ping = serde_json::json!({ "id": ping_id, "type": "ping" }).to_string();
                if let Err(e) = write.send(Message::text(ping)).await {
                    return SocketEnd::Dropped(e.to_string());
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if is_goodbye(text.as_str()) {
                        return SocketEnd::Goodbye;
                    }
                    tracing::trace!(team_id = %connection.team_id(), "RTM event received");
                }
                Some(Ok(Message::Close(_))) | None => {
                    return SocketEnd::Dropped("socket closed".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SocketEnd::Dropped(e.to_string()),
            }
        }
    }
}

fn is_goodbye(frame: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(frame)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|t| t == "goodbye"))
        .unwrap_or(false)
}
