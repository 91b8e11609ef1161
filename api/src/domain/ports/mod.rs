//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod dashboard;
pub mod email;
pub mod repositories;

pub use dashboard::DashboardQueries;
pub use email::{EmailSender, OutgoingEmail, SentEmail};
pub use repositories::{SendLogRepository, SubscriptionRepository, TenantRepository};
