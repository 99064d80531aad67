//! Cache of recent per-credential usage results

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::credentials::CredentialId;
use crate::domain::usage::UsageResult;
use crate::domain::DomainError;

/// A cached result together with the time it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CachedUsage {
    pub result: UsageResult,
    pub stored_at: DateTime<Utc>,
}

impl CachedUsage {
    pub fn new(result: UsageResult) -> Self {
        Self {
            result,
            stored_at: Utc::now(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or_default()
    }

    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > max_age
    }
}

/// Keyed store of usage results with age-based eviction
///
/// Injected where needed; snapshot assembly does not use it.
#[async_trait]
pub trait UsageCache: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: &CredentialId) -> Result<Option<CachedUsage>, DomainError>;

    async fn set(&self, id: &CredentialId, result: UsageResult) -> Result<(), DomainError>;

    async fn remove(&self, id: &CredentialId) -> Result<bool, DomainError>;

    /// Drop every entry stored longer than `max_age` ago, returning how many were dropped
    async fn evict(&self, max_age: Duration) -> Result<usize, DomainError>;

    async fn size(&self) -> Result<usize, DomainError>;
}
