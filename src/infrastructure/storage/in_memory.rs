//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory key-value storage
///
/// Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.read()?.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write()?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key.as_str()).is_some())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.read()?.contains_key(key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::{Credential, CredentialId};

    fn credential(id: &str, secret: &str) -> Credential {
        Credential::new(CredentialId::new(id).unwrap(), secret).unwrap()
    }

    fn key(id: &str) -> CredentialId {
        CredentialId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage: InMemoryStorage<Credential> = InMemoryStorage::new();

        storage.create(credential("a", "fk-secret-a")).await.unwrap();

        let fetched = storage.get(&key("a")).await.unwrap().unwrap();
        assert_eq!(fetched.secret(), "fk-secret-a");
        assert!(storage.get(&key("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let storage: InMemoryStorage<Credential> = InMemoryStorage::new();

        storage.create(credential("a", "fk-secret-a")).await.unwrap();
        let result = storage.create(credential("a", "fk-secret-b")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let storage =
            InMemoryStorage::with_entities(vec![credential("a", "fk-1"), credential("b", "fk-2")]);

        assert!(storage.delete(&key("a")).await.unwrap());
        assert!(!storage.delete(&key("a")).await.unwrap());
        assert!(!storage.exists(&key("a")).await.unwrap());
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }
}
