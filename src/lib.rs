//! Usage Dashboard
//!
//! Aggregated usage and remaining balance across a pool of upstream API keys:
//! - Credential store (in-memory or Redis) with batch import and delete
//! - Bounded-concurrency fan-out of per-key usage fetches
//! - Order-preserving snapshots with clamped totals

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::cache::UsageCache;
use domain::concurrency::BoundedRunner;
use domain::credentials::{Credential, CredentialRepository};
use infrastructure::cache::InMemoryUsageCache;
use infrastructure::credentials::{CredentialService, StorageCredentialRepository};
use infrastructure::storage::StorageFactory;
use infrastructure::usage::{HttpUsageProvider, SnapshotService, UsageFetcher};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.storage_config();
    info!("Storage backend: {:?}", storage_config.storage_type());

    let storage = StorageFactory::create::<Credential>(&storage_config).await?;
    let repository: Arc<dyn CredentialRepository> =
        Arc::new(StorageCredentialRepository::new(storage));

    let provider = HttpUsageProvider::new(config.upstream.provider_config())?;
    info!(endpoint = %provider.endpoint(), "Upstream usage provider configured");

    let cache: Arc<dyn UsageCache> = Arc::new(InMemoryUsageCache::with_config(
        config.cache.in_memory_config(),
    ));
    let fetcher = UsageFetcher::new(Arc::new(provider)).with_cache(cache, config.cache.max_age());

    let runner = BoundedRunner::new(config.aggregation.concurrency);
    info!(concurrency = runner.concurrency(), "Snapshot fan-out configured");

    let credential_service = Arc::new(CredentialService::new(Arc::clone(&repository)));
    let snapshot_service = Arc::new(SnapshotService::new(repository, fetcher.clone(), runner));

    let state = AppState::new(credential_service, snapshot_service, fetcher)
        .with_admin_token(config.auth.admin_token());

    if state.admin_token.is_none() {
        info!("No admin token configured, /api is open");
    }

    Ok(state)
}
