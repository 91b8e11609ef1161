//! Sell-out API Server
//!
//! Backend for the retail sell-out portal: dashboard data from the analytics
//! procedures, tenant listings and scheduled email digests.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod digest;
mod domain;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    NoopEmailSender, PostgresDashboardQueries, PostgresSendLogRepository,
    PostgresSubscriptionRepository, PostgresTenantRepository, ResendEmailClient,
};
use app::{
    DashboardService, DigestLinks, DigestService, NewsletterService, SubscriptionService,
    TenantService,
};
use auth::UnsubscribeSigner;
use config::Config;
use domain::ports::EmailSender;

type PortalDigestService = DigestService<
    PostgresSubscriptionRepository,
    PostgresSendLogRepository,
    PostgresTenantRepository,
    PostgresDashboardQueries,
    dyn EmailSender,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub tenant_service: Arc<TenantService<PostgresTenantRepository>>,
    pub dashboard_service:
        Arc<DashboardService<PostgresDashboardQueries, PostgresTenantRepository>>,
    pub digest_service: Arc<PortalDigestService>,
    pub newsletter_service:
        Arc<NewsletterService<PostgresSendLogRepository, PostgresSubscriptionRepository>>,
    pub subscription_service: Arc<SubscriptionService<PostgresSubscriptionRepository>>,
    pub config: Config,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sellout_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sell-out API...");

    // Load configuration
    let config = Config::from_env();

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let app = build_router(build_state(db, &config))?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Wire adapters and services over one database connection
fn build_state(db: DatabaseConnection, config: &Config) -> AppState {
    // Create adapters
    let tenant_repo = Arc::new(PostgresTenantRepository::new(db.clone()));
    let subscription_repo = Arc::new(PostgresSubscriptionRepository::new(db.clone()));
    let send_log_repo = Arc::new(PostgresSendLogRepository::new(db.clone()));
    let dashboard_queries = Arc::new(PostgresDashboardQueries::new(db));

    let email_sender: Arc<dyn EmailSender> = if config.email_enabled() {
        Arc::new(ResendEmailClient::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        ))
    } else {
        tracing::warn!("EMAIL_API_KEY not set, digests will be logged instead of sent");
        Arc::new(NoopEmailSender)
    };

    let signer = UnsubscribeSigner::new(&config.unsubscribe_secret);

    // Create application services
    let tenant_service = Arc::new(TenantService::new(tenant_repo.clone()));

    let dashboard_service = Arc::new(DashboardService::new(
        dashboard_queries.clone(),
        tenant_repo.clone(),
        Duration::from_secs(config.dashboard_cache_ttl_secs),
        config.dashboard_cache_capacity,
    ));

    let digest_service = Arc::new(DigestService::new(
        subscription_repo.clone(),
        send_log_repo.clone(),
        tenant_repo.clone(),
        dashboard_queries.clone(),
        email_sender,
        signer.clone(),
        DigestLinks::new(&config.app_base_url, &config.api_base_url),
    ));

    let newsletter_service = Arc::new(NewsletterService::new(
        send_log_repo.clone(),
        subscription_repo.clone(),
    ));

    let subscription_service = Arc::new(SubscriptionService::new(
        subscription_repo.clone(),
        signer,
    ));

    AppState {
        tenant_service,
        dashboard_service,
        digest_service,
        newsletter_service,
        subscription_service,
        config: config.clone(),
    }
}

fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    // Rate-limited routes (public links from emails)
    let rate_limited_routes = Router::new()
        .route(
            "/unsubscribe",
            get(handlers::unsubscribe_page).post(handlers::unsubscribe_one_click),
        )
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Portal routes (portal key)
    let portal_routes = Router::new()
        .route("/tenants", get(handlers::list_tenants))
        .route("/tenants/:tenant_id", get(handlers::get_tenant))
        .route(
            "/tenants/:tenant_id/sales/summary",
            get(handlers::sales_summary),
        )
        .route("/tenants/:tenant_id/sales/trend", get(handlers::sales_trend))
        .route(
            "/tenants/:tenant_id/sales/top-products",
            get(handlers::top_products),
        )
        .route(
            "/tenants/:tenant_id/sales/by-store",
            get(handlers::sales_by_store),
        )
        .route(
            "/tenants/:tenant_id/inventory/status",
            get(handlers::inventory_status),
        )
        .route(
            "/tenants/:tenant_id/inventory/abc",
            get(handlers::abc_classification),
        )
        .route(
            "/tenants/:tenant_id/replenishment",
            get(handlers::replenishment),
        )
        .route("/tenants/:tenant_id/predictions", get(handlers::predictions))
        .route("/digest/preview", get(handlers::preview_digest))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::portal_auth_middleware,
        ));

    // Scheduler routes (cron key)
    let cron_routes = Router::new()
        .route("/digest/send", post(handlers::send_due_digests))
        .route("/digest/send/:subscription_id", post(handlers::send_digest))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::cron_auth_middleware,
        ));

    // Build router
    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        // Provider webhook (no auth, uses signature verification)
        .route("/newsletter/confirm", post(handlers::confirm_delivery))
        .merge(rate_limited_routes)
        .merge(portal_routes)
        .merge(cron_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
