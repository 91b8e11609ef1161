//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod dashboard;
pub mod digest;
pub mod newsletter;
pub mod tenants;
pub mod unsubscribe;

pub use dashboard::{
    abc_classification, inventory_status, predictions, replenishment, sales_by_store,
    sales_summary, sales_trend, top_products,
};
pub use digest::{preview_digest, send_digest, send_due_digests};
pub use newsletter::confirm_delivery;
pub use tenants::{get_tenant, list_tenants};
pub use unsubscribe::{unsubscribe_one_click, unsubscribe_page};
