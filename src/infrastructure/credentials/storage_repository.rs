//! Storage-backed credential repository implementation

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::credentials::{Credential, CredentialId, CredentialRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Credential repository over any key-value `Storage` backend
#[derive(Debug)]
pub struct StorageCredentialRepository {
    storage: Arc<dyn Storage<Credential>>,
}

impl StorageCredentialRepository {
    pub fn new(storage: Arc<dyn Storage<Credential>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CredentialRepository for StorageCredentialRepository {
    async fn get(&self, id: &CredentialId) -> Result<Option<Credential>, DomainError> {
        self.storage.get(id).await
    }

    async fn list(&self) -> Result<Vec<Credential>, DomainError> {
        let mut credentials = self.storage.list().await?;
        credentials.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(credentials)
    }

    async fn create(&self, credential: Credential) -> Result<Credential, DomainError> {
        if self.storage.exists(credential.id()).await? {
            return Err(DomainError::conflict(format!(
                "Credential with ID '{}' already exists",
                credential.id()
            )));
        }

        self.storage.create(credential).await
    }

    async fn delete(&self, id: &CredentialId) -> Result<(), DomainError> {
        if !self.storage.delete(id).await? {
            return Err(DomainError::not_found(format!(
                "Credential with ID '{}' not found",
                id
            )));
        }

        Ok(())
    }

    async fn exists(&self, id: &CredentialId) -> Result<bool, DomainError> {
        self.storage.exists(id).await
    }
}
