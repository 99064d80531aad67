//! Credential store contract

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{Credential, CredentialId};
use crate::domain::DomainError;

/// Repository for stored credentials
///
/// `list` returns credentials in a stable order: oldest first, ties broken by id.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get(&self, id: &CredentialId) -> Result<Option<Credential>, DomainError>;

    async fn list(&self) -> Result<Vec<Credential>, DomainError>;

    /// Store a new credential, failing with `Conflict` if the id is taken
    async fn create(&self, credential: Credential) -> Result<Credential, DomainError>;

    /// Delete a credential, failing with `NotFound` if it does not exist
    async fn delete(&self, id: &CredentialId) -> Result<(), DomainError>;

    async fn exists(&self, id: &CredentialId) -> Result<bool, DomainError>;
}
