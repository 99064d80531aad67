//! Credential management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::credentials::{Credential, CredentialId};
use crate::domain::usage::UsageResult;
use crate::infrastructure::credentials::CreateCredentialRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCredentialApiRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub secret: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchImportApiRequest {
    pub secrets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchDeleteApiRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Credential as exposed over the API; the secret is always masked
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub id: String,
    pub masked_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Credential> for CredentialResponse {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id().to_string(),
            masked_secret: credential.masked_secret(),
            display_name: credential.display_name().map(str::to_string),
            created_at: credential.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCredentialsResponse {
    pub credentials: Vec<CredentialResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchImportResponse {
    pub added: Vec<CredentialResponse>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: usize,
    pub missing: Vec<String>,
}

/// GET /api/credentials
pub async fn list_credentials(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ListCredentialsResponse>, ApiError> {
    let credentials: Vec<CredentialResponse> = state
        .credential_service
        .list()
        .await?
        .iter()
        .map(CredentialResponse::from)
        .collect();

    Ok(Json(ListCredentialsResponse {
        total: credentials.len(),
        credentials,
    }))
}

/// POST /api/credentials
pub async fn create_credential(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<CreateCredentialApiRequest>,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    debug!(id = ?request.id, "Creating credential");

    let credential = state
        .credential_service
        .create(CreateCredentialRequest {
            id: request.id,
            secret: request.secret,
            display_name: request.display_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CredentialResponse::from(&credential))))
}

/// POST /api/credentials/batch
pub async fn import_credentials(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<BatchImportApiRequest>,
) -> Result<Json<BatchImportResponse>, ApiError> {
    let result = state.credential_service.import(&request.secrets).await?;

    Ok(Json(BatchImportResponse {
        added: result.added.iter().map(CredentialResponse::from).collect(),
        skipped: result.skipped,
    }))
}

/// POST /api/credentials/batch-delete
pub async fn delete_credentials(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<BatchDeleteApiRequest>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
    let result = state.credential_service.delete_many(&request.ids).await?;

    for id in &request.ids {
        forget_cached_usage(&state, id).await;
    }

    Ok(Json(BatchDeleteResponse {
        deleted: result.deleted,
        missing: result.missing,
    }))
}

/// DELETE /api/credentials/{id}
pub async fn delete_credential(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.credential_service.delete(&id).await?;

    forget_cached_usage(&state, &id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/credentials/{id}/usage
pub async fn get_credential_usage(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageResult>, ApiError> {
    let credential = state.credential_service.get_required(&id).await?;

    Ok(Json(state.fetcher.fetch_cached(&credential, query.refresh).await))
}

async fn forget_cached_usage(state: &AppState, id: &str) {
    let (Some(cache), Ok(id)) = (state.fetcher.cache(), CredentialId::new(id)) else {
        return;
    };

    if let Err(e) = cache.remove(&id).await {
        warn!(credential_id = %id, "Failed to drop cached usage: {}", e);
    }
}
