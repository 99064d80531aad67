//! In-memory usage cache using moka

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{CachedUsage, UsageCache};
use crate::domain::credentials::CredentialId;
use crate::domain::usage::UsageResult;
use crate::domain::DomainError;

/// Configuration for the in-memory usage cache
#[derive(Debug, Clone)]
pub struct InMemoryUsageCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Hard upper bound on how long moka keeps any entry
    pub time_to_live: Duration,
}

impl Default for InMemoryUsageCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Duration::from_secs(3600),
        }
    }
}

impl InMemoryUsageCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }
}

/// Thread-safe usage cache keyed by credential id
#[derive(Debug)]
pub struct InMemoryUsageCache {
    cache: MokaCache<String, CachedUsage>,
}

impl InMemoryUsageCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryUsageCacheConfig::default())
    }

    pub fn with_config(config: InMemoryUsageCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();

        Self { cache }
    }

    #[cfg(test)]
    async fn insert_cached(&self, id: &CredentialId, cached: CachedUsage) {
        self.cache.insert(id.as_str().to_string(), cached).await;
    }
}

impl Default for InMemoryUsageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsageCache for InMemoryUsageCache {
    async fn get(&self, id: &CredentialId) -> Result<Option<CachedUsage>, DomainError> {
        Ok(self.cache.get(id.as_str()).await)
    }

    async fn set(&self, id: &CredentialId, result: UsageResult) -> Result<(), DomainError> {
        self.cache
            .insert(id.as_str().to_string(), CachedUsage::new(result))
            .await;
        Ok(())
    }

    async fn remove(&self, id: &CredentialId) -> Result<bool, DomainError> {
        Ok(self.cache.remove(id.as_str()).await.is_some())
    }

    async fn evict(&self, max_age: Duration) -> Result<usize, DomainError> {
        let now = Utc::now();
        let stale: Vec<_> = self
            .cache
            .iter()
            .filter(|(_, cached)| cached.is_older_than(max_age, now))
            .map(|(key, _)| key)
            .collect();

        for key in &stale {
            self.cache.invalidate(key.as_str()).await;
        }

        Ok(stale.len())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
