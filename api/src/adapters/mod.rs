//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod email;
pub mod postgres;

pub use email::{NoopEmailSender, ResendEmailClient};
pub use postgres::{
    PostgresDashboardQueries, PostgresSendLogRepository, PostgresSubscriptionRepository,
    PostgresTenantRepository,
};
