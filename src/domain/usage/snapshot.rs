//! Point-in-time aggregation snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::UsageResult;
use super::totals::{aggregate, Totals};

/// Source of the instant stamped onto a snapshot
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Aggregated usage across every stored credential
///
/// `data` follows the order credentials were listed from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub update_time: DateTime<Utc>,
    pub total_count: usize,
    pub totals: Totals,
    pub data: Vec<UsageResult>,
}

impl Snapshot {
    pub fn new(update_time: DateTime<Utc>, data: Vec<UsageResult>) -> Self {
        Self {
            update_time,
            total_count: data.len(),
            totals: aggregate(&data),
            data,
        }
    }

    pub fn success_count(&self) -> usize {
        self.data.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total_count - self.success_count()
    }
}
