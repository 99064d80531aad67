use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", admin::create_admin_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::concurrency::BoundedRunner;
    use crate::domain::credentials::Credential;
    use crate::domain::usage::{MockUsageProvider, ProviderError, UpstreamUsage};
    use crate::infrastructure::cache::InMemoryUsageCache;
    use crate::infrastructure::credentials::{CredentialService, StorageCredentialRepository};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::usage::{SnapshotService, UsageFetcher};

    fn provider() -> MockUsageProvider {
        let mut provider = MockUsageProvider::new();
        provider.expect_fetch_usage().returning(|secret| {
            if secret.contains("bad") {
                return Err(ProviderError::Http {
                    status: 401,
                    body: "invalid".to_string(),
                });
            }

            Ok(UpstreamUsage {
                start_date: Utc.timestamp_millis_opt(1_000).unwrap(),
                end_date: Utc.timestamp_millis_opt(2_000).unwrap(),
                total_allowance: 100,
                used: 40,
                used_ratio: None,
            })
        });
        provider
    }

    fn app_with(provider: MockUsageProvider, admin_token: Option<&str>) -> Router {
        let storage = Arc::new(InMemoryStorage::<Credential>::new());
        let repository = Arc::new(StorageCredentialRepository::new(storage));
        let fetcher = UsageFetcher::new(Arc::new(provider))
            .with_cache(Arc::new(InMemoryUsageCache::new()), Duration::from_secs(60));

        let state = AppState::new(
            Arc::new(CredentialService::new(repository.clone())),
            Arc::new(SnapshotService::new(
                repository,
                fetcher.clone(),
                BoundedRunner::new(4),
            )),
            fetcher,
        )
        .with_admin_token(admin_token);

        create_router_with_state(state)
    }

    fn app() -> Router {
        app_with(provider(), None)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_snapshot_without_credentials_is_404() {
        let mut provider = MockUsageProvider::new();
        provider.expect_fetch_usage().never();

        let (status, body) = send(&app_with(provider, None), get("/api/snapshot")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "no_credentials");
    }

    #[tokio::test]
    async fn test_import_then_snapshot() {
        let app = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/credentials/batch",
                json!({ "secrets": ["fk-good-000001", "", "fk-bad-0000002", "fk-good-000001"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["added"].as_array().unwrap().len(), 2);
        assert_eq!(body["skipped"], 2);
        assert_eq!(body["added"][0]["maskedSecret"], "fk-g...0001");

        let (status, body) = send(&app, get("/api/snapshot")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCount"], 2);
        assert_eq!(body["data"][0]["status"], "ok");
        assert_eq!(body["data"][1]["status"], "error");
        assert_eq!(body["data"][1]["errorKind"], "upstream_http_error");
        assert_eq!(body["totals"]["totalAllowance"], 100);
        assert_eq!(body["totals"]["totalUsed"], 40);
        assert_eq!(body["totals"]["totalRemainingClamped"], 60);
    }

    #[tokio::test]
    async fn test_create_list_usage_and_delete() {
        let app = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/credentials",
                json!({ "id": "main", "secret": "fk-main-secret", "displayName": "Main" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "main");
        assert!(body.get("secret").is_none());

        let (status, _) = send(
            &app,
            post_json("/api/credentials", json!({ "id": "main", "secret": "fk-other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, get("/api/credentials")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["credentials"][0]["displayName"], "Main");

        let (status, body) = send(&app, get("/api/credentials/main/usage?refresh=true")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["remaining"], 60);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/credentials/main")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, get("/api/credentials/main/usage")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_delete_reports_missing() {
        let app = app();
        send(
            &app,
            post_json("/api/credentials", json!({ "id": "a", "secret": "fk-aaaaaaaa" })),
        )
        .await;

        let (status, body) = send(
            &app,
            post_json("/api/credentials/batch-delete", json!({ "ids": ["a", "zzz"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);
        assert_eq!(body["missing"], json!(["zzz"]));
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let (status, body) = send(
            &app(),
            post_json("/api/credentials", json!({ "displayName": "no secret" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_admin_token_guards_api() {
        let app = app_with(provider(), Some("s3cret"));

        let (status, _) = send(&app, get("/api/credentials")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/api/credentials")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, wrong).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let right = Request::builder()
            .uri("/api/credentials")
            .header("x-admin-token", "s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, right).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
