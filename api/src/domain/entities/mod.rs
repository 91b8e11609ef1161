//! Domain entities
//!
//! Pure domain models for the sell-out portal.
//! These are separate from the SeaORM models in the `entity` crate.

pub mod dashboard;
pub mod send_log;
pub mod subscription;
pub mod tenant;

pub use dashboard::{
    AbcClass, AbcEntry, DashboardFilter, ForecastPoint, Granularity, InventoryLine,
    ReplenishmentLine, SalesSummary, StoreSales, TopProduct, TrendPoint, MAX_RANGE_DAYS,
};
pub use send_log::{NewSendLog, SendLog, SendLogId, SendStatus};
pub use subscription::{DigestFrequency, DigestSubscription, ReportPeriod, SubscriptionId};
pub use tenant::{Retailer, RetailerId, Tenant, TenantId, TenantWithRetailers};
