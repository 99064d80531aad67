//! Snapshot assembly across every stored credential

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, instrument};

use super::fetcher::{warn_failure, UsageFetcher};
use crate::domain::concurrency::BoundedRunner;
use crate::domain::credentials::CredentialRepository;
use crate::domain::usage::{Clock, Snapshot, SystemClock, UsageErrorKind, UsageResult};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_snapshot, SnapshotMetricParams};

/// Why no snapshot could be produced
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("No credentials are stored")]
    NoCredentials,

    #[error("Failed to read credentials: {0}")]
    Store(#[from] DomainError),
}

/// Fetches usage for every stored credential and aggregates the results
pub struct SnapshotService {
    repository: Arc<dyn CredentialRepository>,
    fetcher: UsageFetcher,
    runner: BoundedRunner,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SnapshotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService")
            .field("fetcher", &self.fetcher)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

impl SnapshotService {
    pub fn new(
        repository: Arc<dyn CredentialRepository>,
        fetcher: UsageFetcher,
        runner: BoundedRunner,
    ) -> Self {
        Self {
            repository,
            fetcher,
            runner,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn runner(&self) -> &BoundedRunner {
        &self.runner
    }

    /// Fetch every stored credential's usage and aggregate it.
    ///
    /// Always fetches fresh; `data` keeps the store's listing order.
    #[instrument(skip(self), fields(concurrency = self.runner.concurrency()))]
    pub async fn build_snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let credentials = self.repository.list().await?;

        if credentials.is_empty() {
            return Err(SnapshotError::NoCredentials);
        }

        let started = Instant::now();

        let tasks: Vec<_> = credentials
            .iter()
            .cloned()
            .map(|credential| {
                let fetcher = self.fetcher.clone();
                move || async move { Ok::<_, Infallible>(fetcher.fetch(&credential).await) }
            })
            .collect();

        let outcomes = self.runner.run(tasks).await;

        let data: Vec<UsageResult> = credentials
            .iter()
            .zip(outcomes)
            .map(|(credential, outcome)| {
                outcome.unwrap_or_else(|e| {
                    let kind = UsageErrorKind::TaskFailed;
                    warn_failure(credential, kind, &e.message);
                    UsageResult::failure(credential, kind, e.message)
                })
            })
            .collect();

        let snapshot = Snapshot::new(self.clock.now(), data);
        let elapsed = started.elapsed();

        record_snapshot(SnapshotMetricParams {
            credentials: snapshot.total_count,
            succeeded: snapshot.success_count(),
            failed: snapshot.failure_count(),
            duration: elapsed,
        });

        info!(
            credentials = snapshot.total_count,
            failed = snapshot.failure_count(),
            total_used = snapshot.totals.total_used,
            elapsed_ms = elapsed.as_millis() as u64,
            "Built usage snapshot"
        );

        Ok(snapshot)
    }
}
