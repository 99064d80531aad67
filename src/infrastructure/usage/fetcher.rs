//! Per-credential usage fetcher

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::cache::UsageCache;
use crate::domain::credentials::Credential;
use crate::domain::usage::{UsageErrorKind, UsageProvider, UsageReport, UsageResult};
use crate::infrastructure::observability::record_usage_fetch;

/// Turns one credential into exactly one `UsageResult`, never an error
#[derive(Clone)]
pub struct UsageFetcher {
    provider: Arc<dyn UsageProvider>,
    cache: Option<Arc<dyn UsageCache>>,
    max_age: Duration,
}

impl std::fmt::Debug for UsageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageFetcher")
            .field("provider", &self.provider.provider_name())
            .field("cache", &self.cache)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl UsageFetcher {
    pub fn new(provider: Arc<dyn UsageProvider>) -> Self {
        Self {
            provider,
            cache: None,
            max_age: Duration::from_secs(300),
        }
    }

    /// Serve single-credential lookups from `cache` while entries are younger than `max_age`
    pub fn with_cache(mut self, cache: Arc<dyn UsageCache>, max_age: Duration) -> Self {
        self.cache = Some(cache);
        self.max_age = max_age;
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn UsageCache>> {
        self.cache.as_ref()
    }

    /// Fetch usage straight from the provider
    pub async fn fetch(&self, credential: &Credential) -> UsageResult {
        if credential.secret().trim().is_empty() {
            let kind = UsageErrorKind::InvalidCredential;
            record_usage_fetch(kind.as_str(), Duration::ZERO);
            warn_failure(credential, kind, "credential secret is blank");
            return UsageResult::failure(credential, kind, "credential secret is blank");
        }

        let started = Instant::now();
        let outcome = self.provider.fetch_usage(credential.secret()).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(usage) => {
                record_usage_fetch("ok", elapsed);
                debug!(
                    credential_id = %credential.id(),
                    used = usage.used,
                    allowance = usage.total_allowance,
                    "Fetched usage"
                );
                UsageResult::Success(UsageReport::from_upstream(credential, usage))
            }
            Err(err) => {
                let kind = err.kind();
                let detail = err.to_string();
                record_usage_fetch(kind.as_str(), elapsed);
                warn_failure(credential, kind, &detail);
                UsageResult::failure(credential, kind, detail)
            }
        }
    }

    /// Fetch usage for a single credential, consulting the cache unless `refresh` is set
    pub async fn fetch_cached(&self, credential: &Credential, refresh: bool) -> UsageResult {
        let Some(cache) = &self.cache else {
            return self.fetch(credential).await;
        };

        if !refresh {
            match cache.get(credential.id()).await {
                Ok(Some(cached)) if !cached.is_older_than(self.max_age, Utc::now()) => {
                    debug!(credential_id = %credential.id(), "Usage cache hit");
                    return cached.result;
                }
                Ok(_) => {}
                Err(e) => warn!(credential_id = %credential.id(), "Usage cache read failed: {}", e),
            }
        }

        let result = self.fetch(credential).await;

        if let Err(e) = cache.set(credential.id(), result.clone()).await {
            warn!(credential_id = %credential.id(), "Usage cache write failed: {}", e);
        }

        result
    }
}

/// Every failed fetch is logged once, with the secret masked
pub(crate) fn warn_failure(credential: &Credential, kind: UsageErrorKind, detail: &str) {
    warn!(
        credential_id = %credential.id(),
        masked_secret = %credential.masked_secret(),
        error_kind = %kind,
        "Usage fetch failed: {}",
        detail
    );
}
