//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod dashboard_rpc;
pub mod send_log_repo;
pub mod subscription_repo;
pub mod tenant_repo;


pub use dashboard_rpc::PostgresDashboardQueries;
pub use send_log_repo::PostgresSendLogRepository;
pub use subscription_repo::PostgresSubscriptionRepository;
pub use tenant_repo::PostgresTenantRepository;
