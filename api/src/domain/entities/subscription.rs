//! Digest subscription domain entity
//!
//! A subscription asks for a periodic summary email of one tenant's sell-out,
//! optionally narrowed to a single retailer.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::{RetailerId, TenantId};

/// Slack applied when deciding whether a digest is due, so a cron run that
/// fires a few minutes early does not push a send back by a whole period.
pub const DUE_GRACE_MINUTES: i64 = 60;

/// Unique identifier for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How often a digest is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl DigestFrequency {
    /// Length of the reporting period in days
    pub fn period_days(&self) -> i64 {
        match self {
            DigestFrequency::Daily => 1,
            DigestFrequency::Weekly => 7,
            DigestFrequency::Monthly => 30,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::days(self.period_days())
    }

    /// Human label used in subjects ("Weekly sell-out digest")
    pub fn label(&self) -> &'static str {
        match self {
            DigestFrequency::Daily => "Daily",
            DigestFrequency::Weekly => "Weekly",
            DigestFrequency::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for DigestFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestFrequency::Daily => write!(f, "daily"),
            DigestFrequency::Weekly => write!(f, "weekly"),
            DigestFrequency::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for DigestFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(DigestFrequency::Daily),
            "weekly" => Ok(DigestFrequency::Weekly),
            "monthly" => Ok(DigestFrequency::Monthly),
            _ => Err(format!("Unknown digest frequency: {}", s)),
        }
    }
}

/// Inclusive date range a digest reports on, plus the equally long range
/// right before it used for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub prev_from: NaiveDate,
    pub prev_to: NaiveDate,
}

impl ReportPeriod {
    /// Period of `days` days ending the day before `today`
    pub fn ending_yesterday(today: NaiveDate, days: i64) -> Self {
        let to = today - Duration::days(1);
        let from = to - Duration::days(days - 1);
        let prev_to = from - Duration::days(1);
        let prev_from = prev_to - Duration::days(days - 1);
        Self {
            from,
            to,
            prev_from,
            prev_to,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestSubscription {
    pub id: SubscriptionId,
    pub tenant_id: TenantId,
    pub retailer_id: Option<RetailerId>,
    pub email: String,
    pub frequency: DigestFrequency,
    pub active: bool,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl DigestSubscription {
    /// Whether a digest should go out at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        match self.last_sent_at {
            None => true,
            Some(last) => {
                now + Duration::minutes(DUE_GRACE_MINUTES) >= last + self.frequency.period()
            }
        }
    }

    pub fn report_period(&self, now: DateTime<Utc>) -> ReportPeriod {
        ReportPeriod::ending_yesterday(now.date_naive(), self.frequency.period_days())
    }
}
