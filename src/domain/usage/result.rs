//! Per-credential usage results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payload::UpstreamUsage;
use crate::domain::credentials::{Credential, CredentialId};

/// Why a credential produced no usage figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageErrorKind {
    /// Secret is blank; nothing was sent upstream
    InvalidCredential,
    /// Provider could not be reached
    TransportError,
    /// Provider answered with a non-success status
    UpstreamHttpError,
    /// Provider answered with an unusable body
    MalformedResponse,
    /// The fetch task itself failed before producing a result
    TaskFailed,
}

impl UsageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::TransportError => "transport_error",
            Self::UpstreamHttpError => "upstream_http_error",
            Self::MalformedResponse => "malformed_response",
            Self::TaskFailed => "task_failed",
        }
    }
}

impl std::fmt::Display for UsageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage figures for a credential that was fetched successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub id: CredentialId,
    pub masked_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_date: DateTime<Utc>,
    pub total_allowance: u64,
    pub used: u64,
    /// Allowance minus used; negative when the credential is over-used
    pub remaining: i64,
    pub used_ratio: f64,
}

impl UsageReport {
    pub fn from_upstream(credential: &Credential, usage: UpstreamUsage) -> Self {
        let used_ratio = resolve_used_ratio(usage.used_ratio, usage.used, usage.total_allowance);

        Self {
            id: credential.id().clone(),
            masked_secret: credential.masked_secret(),
            display_name: credential.display_name().map(str::to_string),
            start_date: usage.start_date,
            end_date: usage.end_date,
            total_allowance: usage.total_allowance,
            used: usage.used,
            remaining: signed_remaining(usage.total_allowance, usage.used),
            used_ratio,
        }
    }
}

/// A credential whose usage could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageFailure {
    pub id: CredentialId,
    pub masked_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub error_kind: UsageErrorKind,
    pub error_detail: String,
}

/// Outcome of one usage fetch, tagged by `status` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UsageResult {
    #[serde(rename = "ok")]
    Success(UsageReport),
    #[serde(rename = "error")]
    Failure(UsageFailure),
}

impl UsageResult {
    pub fn failure(
        credential: &Credential,
        error_kind: UsageErrorKind,
        error_detail: impl Into<String>,
    ) -> Self {
        Self::Failure(UsageFailure {
            id: credential.id().clone(),
            masked_secret: credential.masked_secret(),
            display_name: credential.display_name().map(str::to_string),
            error_kind,
            error_detail: error_detail.into(),
        })
    }

    pub fn id(&self) -> &CredentialId {
        match self {
            Self::Success(report) => &report.id,
            Self::Failure(failure) => &failure.id,
        }
    }

    pub fn masked_secret(&self) -> &str {
        match self {
            Self::Success(report) => &report.masked_secret,
            Self::Failure(failure) => &failure.masked_secret,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&UsageReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Failure(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<UsageErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.error_kind),
        }
    }
}

/// Provider ratio when supplied, otherwise `used / allowance`; always within `[0, 1]`.
///
/// A zero allowance yields 0.
pub fn resolve_used_ratio(provided: Option<f64>, used: u64, total_allowance: u64) -> f64 {
    let ratio = match provided {
        Some(ratio) if ratio.is_finite() => ratio,
        _ if total_allowance == 0 => 0.0,
        _ => used as f64 / total_allowance as f64,
    };

    ratio.clamp(0.0, 1.0)
}

fn signed_remaining(total_allowance: u64, used: u64) -> i64 {
    let allowance = i64::try_from(total_allowance).unwrap_or(i64::MAX);
    let used = i64::try_from(used).unwrap_or(i64::MAX);
    allowance.saturating_sub(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credential() -> Credential {
        Credential::new(CredentialId::new("key-1").unwrap(), "fk-abcdefghijkl").unwrap()
    }

    fn upstream(total_allowance: u64, used: u64, used_ratio: Option<f64>) -> UpstreamUsage {
        UpstreamUsage {
            start_date: Utc.timestamp_millis_opt(1_000).unwrap(),
            end_date: Utc.timestamp_millis_opt(2_000).unwrap(),
            total_allowance,
            used,
            used_ratio,
        }
    }

    #[test]
    fn test_zero_allowance_ratio_is_zero() {
        assert_eq!(resolve_used_ratio(None, 0, 0), 0.0);
        assert_eq!(resolve_used_ratio(None, 500, 0), 0.0);
    }

    #[test]
    fn test_ratio_prefers_provider_value() {
        assert_eq!(resolve_used_ratio(Some(0.9), 10, 100), 0.9);
        assert_eq!(resolve_used_ratio(None, 10, 100), 0.1);
    }

    #[test]
    fn test_ratio_is_clamped() {
        assert_eq!(resolve_used_ratio(None, 150, 100), 1.0);
        assert_eq!(resolve_used_ratio(Some(-0.2), 0, 100), 0.0);
        assert_eq!(resolve_used_ratio(Some(f64::NAN), 25, 100), 0.25);
    }

    #[test]
    fn test_report_keeps_negative_remaining() {
        let report = UsageReport::from_upstream(&credential(), upstream(100, 150, None));

        assert_eq!(report.remaining, -50);
        assert_eq!(report.used_ratio, 1.0);
        assert_eq!(report.masked_secret, "fk-a...ijkl");
    }

    #[test]
    fn test_success_json_shape() {
        let result = UsageResult::Success(UsageReport::from_upstream(
            &credential(),
            upstream(100, 40, Some(0.4)),
        ));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["id"], "key-1");
        assert_eq!(json["maskedSecret"], "fk-a...ijkl");
        assert_eq!(json["startDate"], 1_000);
        assert_eq!(json["endDate"], 2_000);
        assert_eq!(json["totalAllowance"], 100);
        assert_eq!(json["used"], 40);
        assert_eq!(json["remaining"], 60);
        assert_eq!(json["usedRatio"], 0.4);
        assert!(json.get("displayName").is_none());
    }

    #[test]
    fn test_failure_json_shape() {
        let result = UsageResult::failure(
            &credential(),
            UsageErrorKind::UpstreamHttpError,
            "HTTP 401 Unauthorized: bad key",
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["errorKind"], "upstream_http_error");
        assert_eq!(json["errorDetail"], "HTTP 401 Unauthorized: bad key");
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(UsageErrorKind::UpstreamHttpError));
    }

    #[test]
    fn test_error_kind_wire_names_match_log_names() {
        for kind in [
            UsageErrorKind::InvalidCredential,
            UsageErrorKind::TransportError,
            UsageErrorKind::UpstreamHttpError,
            UsageErrorKind::MalformedResponse,
            UsageErrorKind::TaskFailed,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
