use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Public URL of the portal, used for links in digest emails
    pub app_base_url: String,
    /// Public URL of this API, used for unsubscribe links
    pub api_base_url: String,
    /// Email provider API base URL (Resend-compatible)
    pub email_api_url: String,
    /// Email provider API key; when empty, digests are logged instead of sent
    pub email_api_key: String,
    pub email_from: String,
    /// Bearer key the portal frontend uses for data endpoints
    pub portal_api_key: String,
    /// Bearer key the scheduler uses to trigger digest sends
    pub cron_secret: String,
    /// HMAC key for unsubscribe tokens
    pub unsubscribe_secret: String,
    /// Webhook secret for verifying provider delivery events (HMAC-SHA256)
    pub webhook_secret: Option<String>,
    pub dashboard_cache_ttl_secs: u64,
    pub dashboard_cache_capacity: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Sell-out Digest <digest@localhost>".to_string()),
            portal_api_key: env::var("PORTAL_API_KEY").unwrap_or_default(),
            cron_secret: env::var("CRON_SECRET").unwrap_or_default(),
            unsubscribe_secret: env::var("UNSUBSCRIBE_SECRET")
                .unwrap_or_else(|_| "dev-key-not-for-production".to_string()),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            dashboard_cache_ttl_secs: env::var("DASHBOARD_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            dashboard_cache_capacity: env::var("DASHBOARD_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Check if a real email provider is configured
    pub fn email_enabled(&self) -> bool {
        !self.email_api_key.is_empty()
    }
}
