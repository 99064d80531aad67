//! Upstream usage provider contract

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::payload::UpstreamUsage;
use super::result::UsageErrorKind;

/// Failure talking to the upstream provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Request never produced a response (DNS, connect, timeout, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider responded with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Provider responded with success but the body is unusable
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn kind(&self) -> UsageErrorKind {
        match self {
            Self::Transport(_) => UsageErrorKind::TransportError,
            Self::Http { .. } => UsageErrorKind::UpstreamHttpError,
            Self::Malformed(_) => UsageErrorKind::MalformedResponse,
        }
    }
}

/// Reads usage for one credential from the upstream provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Fetch usage, authenticating with `secret` as a bearer token
    async fn fetch_usage(&self, secret: &str) -> Result<UpstreamUsage, ProviderError>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ProviderError::Transport("reset".into()).kind(),
            UsageErrorKind::TransportError
        );
        assert_eq!(
            ProviderError::Http {
                status: 500,
                body: String::new()
            }
            .kind(),
            UsageErrorKind::UpstreamHttpError
        );
        assert_eq!(
            ProviderError::Malformed("x".into()).kind(),
            UsageErrorKind::MalformedResponse
        );
    }

    #[test]
    fn test_http_error_display() {
        let err = ProviderError::Http {
            status: 401,
            body: "invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: invalid token");
    }
}
