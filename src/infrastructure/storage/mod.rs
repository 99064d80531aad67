//! Storage infrastructure - key-value backends

mod factory;
mod in_memory;
mod redis;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use self::redis::{RedisStorage, RedisStorageConfig};
