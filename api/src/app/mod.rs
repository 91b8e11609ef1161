//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod dashboard_service;
pub mod digest_service;
pub mod newsletter_service;
pub mod subscription_service;
pub mod tenant_service;

pub use dashboard_service::{DashboardService, FilterParams, SummaryView};
pub use digest_service::{DeliveryOutcome, Digest, DigestLinks, DigestService, SendReport};
pub use newsletter_service::{ConfirmOutcome, NewsletterService, ProviderEvent};
pub use subscription_service::SubscriptionService;
pub use tenant_service::TenantService;
