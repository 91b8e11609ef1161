//! SeaORM entities for the sell-out schema
//!
//! Tables are owned by the managed Postgres instance; these models only
//! mirror the columns the portal reads and the importer upserts.

pub mod digest_subscriptions;
pub mod fact_sales;
pub mod inventory_snapshots;
pub mod newsletter_send_logs;
pub mod products;
pub mod retailers;
pub mod stores;
pub mod tenants;
