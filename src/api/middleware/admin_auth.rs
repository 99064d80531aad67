//! Admin authentication
//!
//! When an admin token is configured every `/api/*` route requires it, sent as
//! `Authorization: Bearer <token>` or `X-Admin-Token: <token>`. With no token
//! configured the API is open.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Configured admin token, kept only as its SHA-256 digest
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken {
    digest: String,
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken").finish_non_exhaustive()
    }
}

impl AdminToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: digest(token),
        }
    }

    /// Compare digests so the check does not short-circuit on the raw token
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = digest(candidate);

        candidate.len() == self.digest.len()
            && candidate
                .bytes()
                .zip(self.digest.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extractor guarding admin routes
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.admin_token else {
            return Ok(RequireAdmin);
        };

        let presented = extract_admin_token(&parts.headers)?;

        if !expected.verify(&presented) {
            debug!("Rejected admin token");
            return Err(ApiError::forbidden("Invalid admin token"));
        }

        Ok(RequireAdmin)
    }
}

fn extract_admin_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token_header) = headers.get(ADMIN_TOKEN_HEADER) {
        let token = token_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-Admin-Token header encoding"))?;

        return Ok(token.trim().to_string());
    }

    Err(ApiError::unauthorized(
        "Admin token required. Provide via 'Authorization: Bearer <token>' or 'X-Admin-Token: <token>' header",
    ))
}
