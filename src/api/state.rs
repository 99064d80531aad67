//! Application state shared by every handler

use std::sync::Arc;

use crate::api::middleware::AdminToken;
use crate::infrastructure::credentials::CredentialService;
use crate::infrastructure::usage::{SnapshotService, UsageFetcher};

#[derive(Clone, Debug)]
pub struct AppState {
    pub credential_service: Arc<CredentialService>,
    pub snapshot_service: Arc<SnapshotService>,
    /// Single-credential lookups; consults the usage cache
    pub fetcher: UsageFetcher,
    /// `None` leaves the admin API open
    pub admin_token: Option<AdminToken>,
}

impl AppState {
    pub fn new(
        credential_service: Arc<CredentialService>,
        snapshot_service: Arc<SnapshotService>,
        fetcher: UsageFetcher,
    ) -> Self {
        Self {
            credential_service,
            snapshot_service,
            fetcher,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<&str>) -> Self {
        self.admin_token = token.map(AdminToken::new);
        self
    }
}
