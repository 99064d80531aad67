//! Credential entity: one upstream API key the dashboard polls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

const MAX_ID_LEN: usize = 64;
const MASK_VISIBLE: usize = 4;

/// Unique identifier for a stored credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(String);

impl CredentialId {
    /// Create a new credential ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_credential_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CredentialId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CredentialId> for String {
    fn from(id: CredentialId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for CredentialId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_credential_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::invalid_id("Credential ID cannot be empty"));
    }

    if id.len() > MAX_ID_LEN {
        return Err(DomainError::invalid_id(format!(
            "Credential ID cannot exceed {} characters",
            MAX_ID_LEN
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::invalid_id(
            "Credential ID can only contain alphanumeric characters, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Render a secret for display: first four and last four characters.
///
/// Secrets too short to hide anything are masked entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();

    if chars.len() <= MASK_VISIBLE * 2 {
        return "****".to_string();
    }

    let head: String = chars[..MASK_VISIBLE].iter().collect();
    let tail: String = chars[chars.len() - MASK_VISIBLE..].iter().collect();
    format!("{}...{}", head, tail)
}

/// A stored upstream API key
///
/// `Debug` prints the masked secret only.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    id: CredentialId,
    secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential, rejecting blank secrets
    pub fn new(id: CredentialId, secret: impl Into<String>) -> Result<Self, DomainError> {
        let secret = secret.into().trim().to_string();

        if secret.is_empty() {
            return Err(DomainError::validation("Credential secret cannot be empty"));
        }

        Ok(Self {
            id,
            secret,
            display_name: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        self.display_name = (!display_name.trim().is_empty()).then_some(display_name);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn masked_secret(&self) -> String {
        mask_secret(&self.secret)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &self.masked_secret())
            .field("display_name", &self.display_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl StorageEntity for Credential {
    type Key = CredentialId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
