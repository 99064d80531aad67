//! Upstream usage provider over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::debug;

use crate::domain::usage::{ProviderError, UpstreamUsage, UsagePayload, UsageProvider};
use crate::domain::DomainError;

pub const DEFAULT_BASE_URL: &str = "https://app.factory.ai";
pub const DEFAULT_USAGE_PATH: &str = "/api/organization/members/chat-usage";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Characters of an error body kept in the failure detail
const ERROR_BODY_EXCERPT: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpUsageProviderConfig {
    pub base_url: String,
    pub usage_path: String,
    pub timeout: Duration,
}

impl Default for HttpUsageProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            usage_path: DEFAULT_USAGE_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpUsageProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_usage_path(mut self, usage_path: impl Into<String>) -> Self {
        self.usage_path = usage_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.usage_path.starts_with('/') {
            format!("{}{}", base, self.usage_path)
        } else {
            format!("{}/{}", base, self.usage_path)
        }
    }
}

/// Reads usage with `GET {base_url}{usage_path}` and a bearer secret
#[derive(Debug, Clone)]
pub struct HttpUsageProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUsageProvider {
    pub fn new(config: HttpUsageProviderConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl UsageProvider for HttpUsageProvider {
    async fn fetch_usage(&self, secret: &str) -> Result<UpstreamUsage, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", secret))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to read body: {}", e)))?;

        debug!(bytes = body.len(), "Received usage response");

        UsagePayload::parse(&body)
            .into_result()
            .map_err(ProviderError::Malformed)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_EXCERPT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> HttpUsageProvider {
        HttpUsageProvider::new(HttpUsageProviderConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_path() {
        let config = HttpUsageProviderConfig::new("https://example.test/").with_usage_path("usage");
        assert_eq!(config.endpoint(), "https://example.test/usage");

        let config = HttpUsageProviderConfig::new("https://example.test");
        assert_eq!(
            config.endpoint(),
            "https://example.test/api/organization/members/chat-usage"
        );
    }

    #[tokio::test]
    async fn test_fetch_usage_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFAULT_USAGE_PATH))
            .and(header("authorization", "Bearer fk-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "usage": {
                    "startDate": 1_700_000_000_000i64,
                    "endDate": "2023-12-14T22:13:20Z",
                    "standard": {
                        "totalAllowance": 1000,
                        "orgTotalTokensUsed": 250,
                        "usedRatio": 0.25
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let usage = provider_for(&server).await.fetch_usage("fk-secret").await.unwrap();

        assert_eq!(usage.total_allowance, 1000);
        assert_eq!(usage.used, 250);
        assert_eq!(usage.used_ratio, Some(0.25));
        assert_eq!(usage.start_date.timestamp_millis(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_fetch_usage_http_error_keeps_excerpt() {
        let server = MockServer::start().await;
        let long_body = "x".repeat(500);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(long_body))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch_usage("fk-bad").await.unwrap_err();

        match err {
            ProviderError::Http { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.len(), ERROR_BODY_EXCERPT);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_usage_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "usage": {} })))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch_usage("fk-secret").await.unwrap_err();

        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_fetch_usage_transport_error() {
        let config = HttpUsageProviderConfig::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let provider = HttpUsageProvider::new(config).unwrap();

        let err = provider.fetch_usage("fk-secret").await.unwrap_err();

        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
