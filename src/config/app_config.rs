use std::time::Duration;

use serde::Deserialize;

use crate::domain::concurrency::DEFAULT_CONCURRENCY;
use crate::infrastructure::cache::InMemoryUsageCacheConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::{RedisStorageConfig, StorageConfig, StorageType};
use crate::infrastructure::usage::{
    HttpUsageProviderConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USAGE_PATH,
};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    pub aggregation: AggregationConfig,
    pub storage: StorageSettings,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where usage is read from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub usage_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum fetches in flight while building a snapshot
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageType,
    pub redis_url: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_capacity: u64,
    /// Cached usage older than this is refetched and evicted
    pub max_age_secs: u64,
    pub evict_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Required on `/api/*` when set
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            usage_path: DEFAULT_USAGE_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let redis = RedisStorageConfig::default();
        Self {
            backend: StorageType::default(),
            redis_url: redis.url,
            key_prefix: redis.key_prefix,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_age_secs: 300,
            evict_interval_secs: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn provider_config(&self) -> HttpUsageProviderConfig {
        HttpUsageProviderConfig::new(&self.base_url)
            .with_usage_path(&self.usage_path)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

impl StorageSettings {
    pub fn storage_config(&self) -> StorageConfig {
        match self.backend {
            StorageType::Memory => StorageConfig::Memory,
            StorageType::Redis => StorageConfig::Redis(RedisStorageConfig {
                url: self.redis_url.clone(),
                key_prefix: self.key_prefix.clone(),
            }),
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn evict_interval(&self) -> Duration {
        Duration::from_secs(self.evict_interval_secs.max(1))
    }

    /// moka keeps entries a little past `max_age` so eviction stays the only sweep that matters
    pub fn in_memory_config(&self) -> InMemoryUsageCacheConfig {
        InMemoryUsageCacheConfig::default()
            .with_max_capacity(self.max_capacity)
            .with_time_to_live(self.max_age() + self.evict_interval())
    }
}

impl AuthConfig {
    /// Configured token, ignoring blank values
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.upstream.base_url, "https://app.factory.ai");
        assert_eq!(config.upstream.timeout_secs, 15);
        assert_eq!(config.aggregation.concurrency, 8);
        assert_eq!(config.storage.backend, StorageType::Memory);
        assert_eq!(config.storage.key_prefix, "usage-dashboard:credentials");
        assert_eq!(config.cache.max_age_secs, 300);
        assert!(config.auth.admin_token().is_none());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"{"storage": {"backend": "redis"}, "aggregation": {"concurrency": 3}}"#,
                config::FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.aggregation.concurrency, 3);
        assert_eq!(config.server.host, "0.0.0.0");

        match config.storage.storage_config() {
            StorageConfig::Redis(redis) => {
                assert_eq!(redis.url, "redis://127.0.0.1:6379");
                assert_eq!(redis.key_prefix, "usage-dashboard:credentials");
            }
            StorageConfig::Memory => panic!("expected redis storage"),
        }
    }

    #[test]
    fn test_blank_admin_token_is_ignored() {
        let auth = AuthConfig {
            admin_token: Some("   ".to_string()),
        };
        assert!(auth.admin_token().is_none());

        let auth = AuthConfig {
            admin_token: Some("s3cret".to_string()),
        };
        assert_eq!(auth.admin_token(), Some("s3cret"));
    }

    #[test]
    fn test_cache_durations() {
        let cache = CacheConfig {
            evict_interval_secs: 0,
            ..Default::default()
        };

        assert_eq!(cache.max_age(), Duration::from_secs(300));
        assert_eq!(cache.evict_interval(), Duration::from_secs(1));
    }
}
