//! Credential store and management service

mod service;
mod storage_repository;

pub use service::{BatchDeleteResult, BatchImportResult, CreateCredentialRequest, CredentialService};
pub use storage_repository::StorageCredentialRepository;
