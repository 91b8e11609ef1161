//! Dashboard result types
//!
//! Typed rows returned by the analytics stored procedures. The procedures do
//! the aggregation; these types only carry the results to the caller.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::{RetailerId, TenantId};
use crate::error::DomainError;

/// Widest date range a single dashboard query may cover
pub const MAX_RANGE_DAYS: i64 = 731;

/// Default range when the caller gives no dates
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Scope of a dashboard query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DashboardFilter {
    pub tenant_id: TenantId,
    pub retailer_id: Option<RetailerId>,
    pub store_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DashboardFilter {
    /// Number of days covered, both ends inclusive
    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Build a filter, filling in the default range ending the day before
    /// `today` for any missing bound.
    ///
    /// Fails when a default bound would fall before the earliest
    /// representable date.
    pub fn with_defaults(
        tenant_id: TenantId,
        retailer_id: Option<RetailerId>,
        store_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        let to = match to {
            Some(to) => to,
            None => days_before(today, 1)?,
        };
        let from = match from {
            Some(from) => from,
            None => days_before(to, DEFAULT_RANGE_DAYS - 1)?,
        };
        Ok(Self {
            tenant_id,
            retailer_id,
            store_id,
            from,
            to,
        })
    }

    /// Stable text form used as part of cache keys
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.tenant_id,
            self.retailer_id.map(|r| r.to_string()).unwrap_or_default(),
            self.store_id.map(|s| s.to_string()).unwrap_or_default(),
            self.from,
            self.to
        )
    }
}

fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate, DomainError> {
    date.checked_sub_signed(Duration::days(days)).ok_or_else(|| {
        DomainError::Validation(format!("no default range ends on {}", date))
    })
}

/// Bucket size for trend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            _ => Err(format!("Unknown granularity: {}", s)),
        }
    }
}

/// Headline numbers for a period and the one before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SalesSummary {
    pub units: i64,
    pub revenue: f64,
    pub store_count: i64,
    pub product_count: i64,
    pub prev_units: i64,
    pub prev_revenue: f64,
}

impl SalesSummary {
    pub fn units_change_pct(&self) -> Option<f64> {
        change_pct(self.units as f64, self.prev_units as f64)
    }

    pub fn revenue_change_pct(&self) -> Option<f64> {
        change_pct(self.revenue, self.prev_revenue)
    }
}

/// Relative change in percent, `None` when there is no base to compare with
fn change_pct(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub bucket: NaiveDate,
    pub units: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub ean: String,
    pub units: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSales {
    pub store_id: Uuid,
    pub store_name: String,
    pub units: i64,
    pub revenue: f64,
}

/// Stock position of one product in one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub store_id: Uuid,
    pub store_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub stock_units: i64,
    pub avg_daily_units: f64,
    pub days_of_cover: Option<f64>,
    pub out_of_stock: bool,
}

/// ABC class by revenue contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl std::fmt::Display for AbcClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbcClass::A => write!(f, "A"),
            AbcClass::B => write!(f, "B"),
            AbcClass::C => write!(f, "C"),
        }
    }
}

impl std::str::FromStr for AbcClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(AbcClass::A),
            "B" => Ok(AbcClass::B),
            "C" => Ok(AbcClass::C),
            _ => Err(format!("Unknown ABC class: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub revenue: f64,
    pub cumulative_share: f64,
    pub class: AbcClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentLine {
    pub store_id: Uuid,
    pub store_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub stock_units: i64,
    pub avg_daily_units: f64,
    pub suggested_units: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_units: f64,
    pub lower: f64,
    pub upper: f64,
}
