//! Cache domain - recent usage results keyed by credential

mod usage_cache;

pub use usage_cache::{CachedUsage, UsageCache};
