mod settings;

pub use settings::{
    ConnectorConfig, DatabaseConfig, OtelConfig, RedisConfig, ServerConfig, Settings,
    SlackAppConfig, StorageConfig,
};
