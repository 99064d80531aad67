//! Aggregate totals across credentials

use serde::{Deserialize, Serialize};

use super::result::{UsageReport, UsageResult};

/// Summed usage across all successfully fetched credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_allowance: u64,
    pub total_used: u64,
    /// Sum of per-credential remaining, each floored at zero first
    pub total_remaining_clamped: u64,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one credential into the totals.
    ///
    /// An over-used credential contributes zero remaining; it never offsets
    /// what other credentials have left.
    pub fn add_report(&mut self, report: &UsageReport) {
        self.total_allowance = self.total_allowance.saturating_add(report.total_allowance);
        self.total_used = self.total_used.saturating_add(report.used);
        self.total_remaining_clamped = self
            .total_remaining_clamped
            .saturating_add(report.total_allowance.saturating_sub(report.used));
    }
}

/// Compute totals over the successful results; failures are skipped.
pub fn aggregate(results: &[UsageResult]) -> Totals {
    results
        .iter()
        .filter_map(UsageResult::report)
        .fold(Totals::new(), |mut totals, report| {
            totals.add_report(report);
            totals
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::{Credential, CredentialId};
    use crate::domain::usage::{UpstreamUsage, UsageErrorKind};
    use chrono::Utc;

    fn credential(id: &str) -> Credential {
        Credential::new(CredentialId::new(id).unwrap(), format!("fk-secret-{}", id)).unwrap()
    }

    fn ok(id: &str, total_allowance: u64, used: u64) -> UsageResult {
        UsageResult::Success(UsageReport::from_upstream(
            &credential(id),
            UpstreamUsage {
                start_date: Utc::now(),
                end_date: Utc::now(),
                total_allowance,
                used,
                used_ratio: None,
            },
        ))
    }

    fn err(id: &str) -> UsageResult {
        UsageResult::failure(&credential(id), UsageErrorKind::TransportError, "timed out")
    }

    #[test]
    fn test_clamped_aggregation() {
        let results = vec![ok("a", 100, 50), ok("b", 100, 150), ok("c", 50, 50)];

        let totals = aggregate(&results);

        assert_eq!(totals.total_allowance, 250);
        assert_eq!(totals.total_used, 250);
        assert_eq!(totals.total_remaining_clamped, 50);
        assert_eq!(results[1].report().unwrap().remaining, -50);
    }

    #[test]
    fn test_failures_are_excluded() {
        let results = vec![ok("a", 100, 10), err("b"), ok("c", 20, 5)];

        let totals = aggregate(&results);

        assert_eq!(totals.total_allowance, 120);
        assert_eq!(totals.total_used, 15);
        assert_eq!(totals.total_remaining_clamped, 105);
    }

    #[test]
    fn test_empty_and_all_failed_are_zero() {
        assert_eq!(aggregate(&[]), Totals::default());
        assert_eq!(aggregate(&[err("a"), err("b")]), Totals::default());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let results = vec![ok("a", 7, 3), ok("b", 5, 9), err("c")];

        let first = aggregate(&results);
        let second = aggregate(&results);

        assert_eq!(first, second);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_order_does_not_matter() {
        let forward = vec![ok("a", 100, 50), ok("b", 100, 150), ok("c", 50, 50)];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        assert_eq!(aggregate(&forward), aggregate(&reversed));
    }

    #[test]
    fn test_totals_json_shape() {
        let json = serde_json::to_value(aggregate(&[ok("a", 10, 4)])).unwrap();

        assert_eq!(json["totalAllowance"], 10);
        assert_eq!(json["totalUsed"], 4);
        assert_eq!(json["totalRemainingClamped"], 6);
    }
}
