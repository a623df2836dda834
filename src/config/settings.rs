use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::gateway::{BackoffConfig, SlackDriverConfig};
use crate::infrastructure::CircuitBreakerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub slack: SlackAppConfig,
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

/// Slack app registration, as configured for the OAuth install flow
#[derive(Clone, Deserialize)]
pub struct SlackAppConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// OAuth `state` parameter
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl std::fmt::Debug for SlackAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Keep live RTM sessions; when false the connector only ticks plugins
    #[serde(default = "default_start_rtm")]
    pub start_rtm: bool,
    /// Plugin names, in dispatch order
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Tick interval in passive mode (ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// RTM ping interval in seconds
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Web API request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub reconnect: BackoffConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `memory`, `redis` or `postgres`
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Required in `X-API-Key` for admin write endpoints when set
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_start_rtm() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    1500
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_redis_prefix() -> String {
    "ara:connector".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost:5432/ara".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "ara-team-connector".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("connector.start_rtm", default_start_rtm())?
            .set_default("storage.backend", default_storage_backend())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // ARA__SLACK__CLIENT_ID, ARA__CONNECTOR__START_RTM, ARA__CONNECTOR__PLUGINS=a,b ...
            .add_source(
                Environment::with_prefix("ARA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("slack.scopes")
                    .with_list_parse_key("connector.plugins"),
            );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the background tasks cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connector.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "connector.tick_interval_ms must be greater than 0".into(),
            ));
        }
        if self.connector.ping_interval_secs == 0 {
            return Err(ConfigError::Message(
                "connector.ping_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn slack_driver_config(&self) -> SlackDriverConfig {
        SlackDriverConfig {
            api_base_url: self.slack.api_base_url.clone(),
            ping_interval: Duration::from_secs(self.connector.ping_interval_secs),
            request_timeout: Duration::from_secs(self.connector.request_timeout_secs),
            reconnect: self.connector.reconnect.clone(),
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            start_rtm: default_start_rtm(),
            plugins: vec![],
            tick_interval_ms: default_tick_interval_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            reconnect: BackoffConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            redis_prefix: default_redis_prefix(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
