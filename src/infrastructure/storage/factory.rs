//! Storage factory for runtime backend selection

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::redis::{RedisStorage, RedisStorageConfig};

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// In-process map (development and tests)
    #[default]
    Memory,
    /// Redis key-value store
    Redis,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::Memory),
            "redis" => Some(Self::Redis),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Memory,
    Redis(RedisStorageConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::Memory => StorageType::Memory,
            Self::Redis(_) => StorageType::Redis,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    pub async fn create<E>(config: &StorageConfig) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match config {
            StorageConfig::Memory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            StorageConfig::Redis(redis_config) => {
                let storage = RedisStorage::<E>::connect(redis_config.clone()).await?;
                Ok(Arc::new(storage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::Credential;

    #[test]
    fn test_storage_type_parse() {
        assert_eq!(StorageType::parse("memory"), Some(StorageType::Memory));
        assert_eq!(StorageType::parse("In-Memory"), Some(StorageType::Memory));
        assert_eq!(StorageType::parse("REDIS"), Some(StorageType::Redis));
        assert_eq!(StorageType::parse("postgres"), None);
    }

    #[test]
    fn test_storage_config_type() {
        assert_eq!(StorageConfig::Memory.storage_type(), StorageType::Memory);
        assert_eq!(
            StorageConfig::Redis(RedisStorageConfig::default()).storage_type(),
            StorageType::Redis
        );
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = StorageFactory::create::<Credential>(&StorageConfig::Memory)
            .await
            .unwrap();

        assert!(storage.list().await.unwrap().is_empty());
    }
}
