//! Key-value storage trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Key-value store holding JSON-serializable entities
///
/// Backends make no ordering promise for `list`; callers that need a stable
/// order sort the result themselves.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Reads the entity stored under `key`
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Reads every stored entity
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Stores a new entity, failing with `Conflict` when the key is taken
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Removes the entity under `key`, returning whether it existed
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }
}
