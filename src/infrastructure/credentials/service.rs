//! Credential service for managing stored credentials

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

use crate::domain::credentials::{Credential, CredentialId, CredentialRepository};
use crate::domain::DomainError;

/// Request to create a new credential
#[derive(Debug, Clone, Default)]
pub struct CreateCredentialRequest {
    /// Generated when absent
    pub id: Option<String>,
    pub secret: String,
    pub display_name: Option<String>,
}

/// Outcome of importing many secrets at once
#[derive(Debug, Clone, Default)]
pub struct BatchImportResult {
    pub added: Vec<Credential>,
    /// Blank lines and secrets already stored or repeated in the batch
    pub skipped: usize,
}

/// Outcome of deleting many credentials at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteResult {
    pub deleted: usize,
    pub missing: Vec<String>,
}

/// Service for managing stored credentials
pub struct CredentialService {
    repository: Arc<dyn CredentialRepository>,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService").finish_non_exhaustive()
    }
}

impl CredentialService {
    pub fn new(repository: Arc<dyn CredentialRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<dyn CredentialRepository> {
        Arc::clone(&self.repository)
    }

    #[instrument(skip(self, request), fields(id = ?request.id))]
    pub async fn create(&self, request: CreateCredentialRequest) -> Result<Credential, DomainError> {
        let id = match request.id {
            Some(id) => CredentialId::new(id)?,
            None => CredentialId::generate(),
        };

        let mut credential = Credential::new(id, request.secret)?;

        if let Some(display_name) = request.display_name {
            credential = credential.with_display_name(display_name);
        }

        let created = self.repository.create(credential).await?;
        info!(credential_id = %created.id(), "Created credential");

        Ok(created)
    }

    /// Add every new, non-blank secret; import order is kept in listings.
    #[instrument(skip(self, secrets))]
    pub async fn import<I, S>(&self, secrets: I) -> Result<BatchImportResult, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let secrets: Vec<S> = secrets.into_iter().collect();
        debug!(count = secrets.len(), "Importing credentials");

        let mut seen: HashSet<String> = self
            .repository
            .list()
            .await?
            .into_iter()
            .map(|c| c.secret().to_string())
            .collect();

        let base = Utc::now();
        let mut result = BatchImportResult::default();

        for secret in secrets {
            let secret = secret.as_ref().trim();

            if secret.is_empty() || !seen.insert(secret.to_string()) {
                result.skipped += 1;
                continue;
            }

            let offset = Duration::microseconds(result.added.len() as i64);
            let credential =
                Credential::new(CredentialId::generate(), secret)?.with_created_at(base + offset);

            result.added.push(self.repository.create(credential).await?);
        }

        info!(
            added = result.added.len(),
            skipped = result.skipped,
            "Imported credentials"
        );

        Ok(result)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Credential>, DomainError> {
        let credential_id = CredentialId::new(id)?;
        self.repository.get(&credential_id).await
    }

    pub async fn get_required(&self, id: &str) -> Result<Credential, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Credential>, DomainError> {
        self.repository.list().await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let credential_id = CredentialId::new(id)?;
        self.repository.delete(&credential_id).await?;
        info!(credential_id = %credential_id, "Deleted credential");
        Ok(())
    }

    /// Delete each id in turn; unknown or malformed ids are reported, not fatal
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[String]) -> Result<BatchDeleteResult, DomainError> {
        let mut result = BatchDeleteResult::default();

        for id in ids {
            match self.delete(id).await {
                Ok(()) => result.deleted += 1,
                Err(DomainError::NotFound { .. }) | Err(DomainError::InvalidId { .. }) => {
                    result.missing.push(id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }
}
