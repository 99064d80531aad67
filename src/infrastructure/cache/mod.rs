//! Cache infrastructure - usage cache implementations

mod in_memory;

pub use in_memory::{InMemoryUsageCache, InMemoryUsageCacheConfig};
