//! Admin API endpoints for credentials and usage snapshots

pub mod credentials;
pub mod snapshot;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create the `/api` router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/snapshot", get(snapshot::get_snapshot))
        .route("/credentials", get(credentials::list_credentials))
        .route("/credentials", post(credentials::create_credential))
        .route("/credentials/batch", post(credentials::import_credentials))
        .route("/credentials/batch-delete", post(credentials::delete_credentials))
        .route("/credentials/{id}", delete(credentials::delete_credential))
        .route("/credentials/{id}/usage", get(credentials::get_credential_usage))
}
