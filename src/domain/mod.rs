//! Domain layer - Core business logic and entities

pub mod cache;
pub mod concurrency;
pub mod credentials;
pub mod error;
pub mod storage;
pub mod usage;

pub use cache::{CachedUsage, UsageCache};
pub use concurrency::{BoundedRunner, TaskError, TaskOutcome};
pub use credentials::{Credential, CredentialId, CredentialRepository};
pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};
pub use usage::{
    aggregate, Clock, ProviderError, Snapshot, SystemClock, Totals, UpstreamUsage, UsageErrorKind,
    UsageProvider, UsageReport, UsageResult,
};
