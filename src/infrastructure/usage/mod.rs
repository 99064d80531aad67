//! Usage infrastructure - upstream provider, fetcher and snapshot assembly

mod fetcher;
mod http_provider;
mod snapshot_service;

pub use fetcher::UsageFetcher;
pub use http_provider::{
    HttpUsageProvider, HttpUsageProviderConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USAGE_PATH,
};
pub use snapshot_service::{SnapshotError, SnapshotService};
