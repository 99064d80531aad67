//! Application configuration

mod app_config;

pub use app_config::{
    AggregationConfig, AppConfig, AuthConfig, CacheConfig, LogFormat, LoggingConfig,
    ServerConfig, StorageSettings, UpstreamConfig,
};
