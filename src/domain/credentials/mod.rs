//! Credential domain

mod credential;
mod repository;

pub use credential::{mask_secret, Credential, CredentialId};
pub use repository::CredentialRepository;

#[cfg(test)]
pub use repository::MockCredentialRepository;
