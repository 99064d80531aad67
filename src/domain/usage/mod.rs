//! Usage domain - per-credential results, totals and snapshots

mod payload;
mod provider;
mod result;
mod snapshot;
mod totals;

pub use payload::{UpstreamUsage, UsagePayload};
pub use provider::{ProviderError, UsageProvider};
pub use result::{resolve_used_ratio, UsageErrorKind, UsageFailure, UsageReport, UsageResult};
pub use snapshot::{Clock, FixedClock, Snapshot, SystemClock};
pub use totals::{aggregate, Totals};

#[cfg(test)]
pub use provider::MockUsageProvider;
