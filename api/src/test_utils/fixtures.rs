//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::app::Digest;
use crate::domain::entities::{
    DigestFrequency, DigestSubscription, InventoryLine, ReplenishmentLine, ReportPeriod, Retailer,
    RetailerId, SalesSummary, SendLog, SendLogId, SendStatus, SubscriptionId, Tenant, TenantId,
    TopProduct,
};

/// Create an active test tenant
pub fn test_tenant() -> Tenant {
    test_tenant_named("Acme Foods")
}

/// Create an active test tenant with a specific name
pub fn test_tenant_named(name: &str) -> Tenant {
    Tenant {
        id: TenantId(Uuid::new_v4()),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        active: true,
        created_at: Utc::now(),
    }
}

/// Create a retailer belonging to a tenant
pub fn test_retailer(tenant: &Tenant, name: &str) -> Retailer {
    Retailer {
        id: RetailerId(Uuid::new_v4()),
        tenant_id: tenant.id,
        name: name.to_string(),
        code: name.to_uppercase().replace(' ', "_"),
    }
}

/// Create an active, never-sent subscription for a tenant
pub fn test_subscription(tenant: &Tenant, frequency: DigestFrequency) -> DigestSubscription {
    DigestSubscription {
        id: SubscriptionId(Uuid::new_v4()),
        tenant_id: tenant.id,
        retailer_id: None,
        email: "buyer@example.com".to_string(),
        frequency,
        active: true,
        last_sent_at: None,
        created_at: Utc::now(),
        unsubscribed_at: None,
    }
}

/// Create a send log for a subscription with a provider message id
pub fn test_send_log(subscription: &DigestSubscription, message_id: &str) -> SendLog {
    SendLog {
        id: SendLogId::new(),
        subscription_id: subscription.id,
        tenant_id: subscription.tenant_id,
        email: subscription.email.clone(),
        subject: "Weekly sell-out digest".to_string(),
        status: SendStatus::Sent,
        provider_message_id: Some(message_id.to_string()),
        error: None,
        sent_at: Utc::now(),
        delivered_at: None,
    }
}

/// Summary with a 25% unit increase and a 10% revenue increase
pub fn test_summary() -> SalesSummary {
    SalesSummary {
        units: 1250,
        revenue: 5500.0,
        store_count: 12,
        product_count: 48,
        prev_units: 1000,
        prev_revenue: 5000.0,
    }
}

pub fn test_top_product(name: &str, units: i64) -> TopProduct {
    TopProduct {
        product_id: Uuid::new_v4(),
        product_name: name.to_string(),
        ean: "4000000000001".to_string(),
        units,
        revenue: units as f64 * 1.99,
    }
}

/// Inventory line; out of stock when `stock_units` is zero or below
pub fn test_inventory_line(product_name: &str, stock_units: i64) -> InventoryLine {
    InventoryLine {
        store_id: Uuid::new_v4(),
        store_name: "Store 1".to_string(),
        product_id: Uuid::new_v4(),
        product_name: product_name.to_string(),
        stock_units,
        avg_daily_units: 2.5,
        days_of_cover: if stock_units > 0 {
            Some(stock_units as f64 / 2.5)
        } else {
            None
        },
        out_of_stock: stock_units <= 0,
    }
}

pub fn test_replenishment_line(suggested_units: i64) -> ReplenishmentLine {
    ReplenishmentLine {
        store_id: Uuid::new_v4(),
        store_name: "Store 1".to_string(),
        product_id: Uuid::new_v4(),
        product_name: "Cola 0.5l".to_string(),
        stock_units: 3,
        avg_daily_units: 2.5,
        suggested_units,
    }
}

/// A weekly digest for "Acme Foods / North Mart" covering 2024-03-04..=2024-03-10
pub fn test_digest() -> Digest {
    let today = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
    Digest {
        subscription_id: SubscriptionId::new(),
        email: "buyer@example.com".to_string(),
        tenant_name: "Acme Foods".to_string(),
        retailer_name: Some("North Mart".to_string()),
        frequency: DigestFrequency::Weekly,
        period: ReportPeriod::ending_yesterday(today, 7),
        summary: test_summary(),
        top_products: vec![
            test_top_product("Cola 0.5l", 420),
            test_top_product("Lemonade 1l", 210),
        ],
        out_of_stock: vec![test_inventory_line("Iced Tea 0.5l", 0)],
        out_of_stock_total: 1,
        replenishment_count: 3,
        dashboard_url: "https://portal.example.com/dashboard?tenant=1".to_string(),
        unsubscribe_url: "https://api.example.com/unsubscribe?token=abc.def".to_string(),
    }
}
