//! Upstream usage payload, validated once at the provider boundary

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Usage figures for one credential as reported by the upstream provider
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamUsage {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_allowance: u64,
    pub used: u64,
    /// Ratio supplied by the provider, if any
    pub used_ratio: Option<f64>,
}

/// Outcome of validating an upstream response body
#[derive(Debug, Clone, PartialEq)]
pub enum UsagePayload {
    Parsed(UpstreamUsage),
    Malformed(String),
}

impl UsagePayload {
    /// Validate a raw success body
    pub fn parse(body: &[u8]) -> Self {
        let envelope: RawEnvelope = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(e) => return Self::Malformed(format!("invalid usage JSON: {}", e)),
        };

        match envelope.into_usage() {
            Ok(usage) => Self::Parsed(usage),
            Err(reason) => Self::Malformed(reason),
        }
    }

    pub fn into_result(self) -> Result<UpstreamUsage, String> {
        match self {
            Self::Parsed(usage) => Ok(usage),
            Self::Malformed(reason) => Err(reason),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    usage: Option<RawUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUsage {
    start_date: Option<RawInstant>,
    end_date: Option<RawInstant>,
    standard: Option<RawStandard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStandard {
    total_allowance: Option<serde_json::Number>,
    org_total_tokens_used: Option<serde_json::Number>,
    used_ratio: Option<f64>,
}

/// Epoch milliseconds or an RFC 3339 timestamp
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInstant {
    Millis(i64),
    Text(String),
}

impl RawInstant {
    fn to_datetime(&self, field: &str) -> Result<DateTime<Utc>, String> {
        match self {
            Self::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| format!("{} is out of range: {}", field, ms)),
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("{} is not a valid timestamp: {}", field, e)),
        }
    }
}

impl RawEnvelope {
    fn into_usage(self) -> Result<UpstreamUsage, String> {
        let usage = self.usage.ok_or("missing field: usage")?;
        let standard = usage.standard.ok_or("missing field: usage.standard")?;

        let start_date = usage
            .start_date
            .ok_or("missing field: usage.startDate")?
            .to_datetime("usage.startDate")?;
        let end_date = usage
            .end_date
            .ok_or("missing field: usage.endDate")?
            .to_datetime("usage.endDate")?;

        let total_allowance = amount(standard.total_allowance, "usage.standard.totalAllowance")?;
        let used = amount(
            standard.org_total_tokens_used,
            "usage.standard.orgTotalTokensUsed",
        )?;

        let used_ratio = match standard.used_ratio {
            Some(ratio) if !ratio.is_finite() => {
                return Err(format!("usage.standard.usedRatio is not finite: {}", ratio));
            }
            other => other,
        };

        Ok(UpstreamUsage {
            start_date,
            end_date,
            total_allowance,
            used,
            used_ratio,
        })
    }
}

/// Token counts are integers; a float is accepted only when it is whole
fn amount(value: Option<serde_json::Number>, field: &str) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("missing field: {}", field))?;

    if let Some(exact) = value.as_u64() {
        return Ok(exact);
    }

    match value.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(v as u64)
        }
        _ => Err(format!(
            "{} must be a non-negative integer, got {}",
            field, value
        )),
    }
}
