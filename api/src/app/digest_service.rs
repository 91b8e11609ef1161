//! Digest service
//!
//! Builds sell-out digests for subscriptions, previews them and sends the
//! ones that are due. Sends run one after another; every provider attempt
//! leaves a send log behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::UnsubscribeSigner;
use crate::digest::{render_digest, RenderedDigest};
use crate::domain::entities::{
    DashboardFilter, DigestFrequency, DigestSubscription, InventoryLine, NewSendLog, ReportPeriod,
    SalesSummary, SendStatus, SubscriptionId, TopProduct,
};
use crate::domain::ports::{
    DashboardQueries, EmailSender, OutgoingEmail, SendLogRepository, SubscriptionRepository,
    TenantRepository,
};
use crate::error::{AppError, DomainError};

/// Products listed in the top-products section
pub const DIGEST_TOP_PRODUCTS: i64 = 5;

/// Out-of-stock lines listed before collapsing into "and N more"
pub const DIGEST_OOS_LINES: usize = 10;

/// Everything a digest email shows
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub subscription_id: SubscriptionId,
    pub email: String,
    pub tenant_name: String,
    pub retailer_name: Option<String>,
    pub frequency: DigestFrequency,
    pub period: ReportPeriod,
    pub summary: SalesSummary,
    pub top_products: Vec<TopProduct>,
    /// First out-of-stock lines, at most `DIGEST_OOS_LINES`
    pub out_of_stock: Vec<InventoryLine>,
    pub out_of_stock_total: usize,
    pub replenishment_count: usize,
    pub dashboard_url: String,
    pub unsubscribe_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Skipped,
}

/// Result of sending one digest
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub subscription_id: SubscriptionId,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Totals of a scheduled send run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Base URLs for the links in a digest email
#[derive(Debug, Clone)]
pub struct DigestLinks {
    /// Portal frontend, target of the dashboard link
    app_base_url: String,
    /// This API, which serves the unsubscribe routes
    api_base_url: String,
}

impl DigestLinks {
    pub fn new(app_base_url: &str, api_base_url: &str) -> Self {
        Self {
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Service for building and sending digests
pub struct DigestService<SR, LR, TR, Q, E>
where
    SR: SubscriptionRepository,
    LR: SendLogRepository,
    TR: TenantRepository,
    Q: DashboardQueries,
    E: EmailSender + ?Sized,
{
    subscriptions: Arc<SR>,
    send_logs: Arc<LR>,
    tenants: Arc<TR>,
    queries: Arc<Q>,
    email: Arc<E>,
    signer: UnsubscribeSigner,
    links: DigestLinks,
}

impl<SR, LR, TR, Q, E> DigestService<SR, LR, TR, Q, E>
where
    SR: SubscriptionRepository,
    LR: SendLogRepository,
    TR: TenantRepository,
    Q: DashboardQueries,
    E: EmailSender + ?Sized,
{
    pub fn new(
        subscriptions: Arc<SR>,
        send_logs: Arc<LR>,
        tenants: Arc<TR>,
        queries: Arc<Q>,
        email: Arc<E>,
        signer: UnsubscribeSigner,
        links: DigestLinks,
    ) -> Self {
        Self {
            subscriptions,
            send_logs,
            tenants,
            queries,
            email,
            signer,
            links,
        }
    }

    /// Collect digest data for a subscription.
    ///
    /// Returns `None` when the tenant no longer exists or is inactive.
    pub async fn build(
        &self,
        subscription: &DigestSubscription,
        now: DateTime<Utc>,
    ) -> Result<Option<Digest>, AppError> {
        let tenant = match self.tenants.find_by_id(&subscription.tenant_id).await? {
            Some(tenant) if tenant.active => tenant,
            _ => return Ok(None),
        };

        let retailer_name = match subscription.retailer_id {
            Some(retailer_id) => self
                .tenants
                .find_retailers(&[tenant.id])
                .await?
                .into_iter()
                .find(|r| r.id == retailer_id)
                .map(|r| r.name),
            None => None,
        };

        let period = subscription.report_period(now);
        let filter = DashboardFilter {
            tenant_id: tenant.id,
            retailer_id: subscription.retailer_id,
            store_id: None,
            from: period.from,
            to: period.to,
        };

        let summary = self.queries.sales_summary(&filter).await?;
        let top_products = self
            .queries
            .top_products(&filter, DIGEST_TOP_PRODUCTS)
            .await?;

        let mut out_of_stock: Vec<InventoryLine> = self
            .queries
            .inventory_status(&filter)
            .await?
            .into_iter()
            .filter(|line| line.out_of_stock)
            .collect();
        let out_of_stock_total = out_of_stock.len();
        out_of_stock.truncate(DIGEST_OOS_LINES);

        let replenishment_count = self
            .queries
            .replenishment(&filter)
            .await?
            .iter()
            .filter(|line| line.suggested_units > 0)
            .count();

        let mut dashboard_url = format!("{}/dashboard?tenant={}", self.links.app_base_url, tenant.id);
        if let Some(retailer_id) = subscription.retailer_id {
            dashboard_url.push_str(&format!("&retailer={}", retailer_id));
        }
        let token = self.signer.sign(&subscription.id)?;
        let unsubscribe_url = format!(
            "{}/unsubscribe?token={}",
            self.links.api_base_url,
            urlencoding::encode(&token)
        );

        Ok(Some(Digest {
            subscription_id: subscription.id,
            email: subscription.email.clone(),
            tenant_name: tenant.name,
            retailer_name,
            frequency: subscription.frequency,
            period,
            summary,
            top_products,
            out_of_stock,
            out_of_stock_total,
            replenishment_count,
            dashboard_url,
            unsubscribe_url,
        }))
    }

    /// Render a subscription's digest without sending it
    pub async fn preview(
        &self,
        id: &SubscriptionId,
        now: DateTime<Utc>,
    ) -> Result<RenderedDigest, AppError> {
        let subscription = self.find_subscription(id).await?;

        let digest = self
            .build(&subscription, now)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Tenant {}", subscription.tenant_id)))?;

        Ok(render_digest(&digest))
    }

    /// Send every active subscription whose digest is due at `now`
    pub async fn send_due(&self, now: DateTime<Utc>) -> Result<SendReport, AppError> {
        let due: Vec<DigestSubscription> = self
            .subscriptions
            .find_active()
            .await?
            .into_iter()
            .filter(|s| s.is_due(now))
            .collect();

        tracing::info!(due = due.len(), "Starting digest send run");

        let mut report = SendReport::default();
        for subscription in &due {
            report.attempted += 1;
            match self.deliver(subscription, now).await {
                Ok(outcome) if outcome.status == DeliveryStatus::Sent => report.sent += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        subscription_id = %subscription.id,
                        "Digest send failed"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Digest send run finished"
        );

        Ok(report)
    }

    /// Send one subscription's digest now, whether or not it is due
    pub async fn send_one(
        &self,
        id: &SubscriptionId,
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome, AppError> {
        let subscription = self.find_subscription(id).await?;
        if !subscription.active {
            return Err(AppError::BadRequest(format!(
                "Subscription {} is not active",
                id
            )));
        }

        self.deliver(&subscription, now).await
    }

    async fn find_subscription(&self, id: &SubscriptionId) -> Result<DigestSubscription, AppError> {
        self.subscriptions
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Subscription {}", id)).into())
    }

    async fn deliver(
        &self,
        subscription: &DigestSubscription,
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome, AppError> {
        let built = match self.build(subscription, now).await {
            Ok(built) => built,
            Err(e) => {
                let log = NewSendLog {
                    subscription_id: subscription.id,
                    tenant_id: subscription.tenant_id,
                    email: subscription.email.clone(),
                    subject: format!("{} sell-out digest", subscription.frequency.label()),
                    status: SendStatus::Failed,
                    provider_message_id: None,
                    error: Some(e.to_string()),
                };
                if let Err(log_err) = self.send_logs.create(&log).await {
                    tracing::error!(error = %log_err, subscription_id = %subscription.id, "Failed to write send log");
                }
                return Err(e);
            }
        };

        let Some(digest) = built else {
            tracing::info!(
                subscription_id = %subscription.id,
                tenant_id = %subscription.tenant_id,
                "Skipping digest for inactive tenant"
            );
            return Ok(DeliveryOutcome {
                subscription_id: subscription.id,
                status: DeliveryStatus::Skipped,
                message_id: None,
            });
        };

        let rendered = render_digest(&digest);
        let email = OutgoingEmail {
            to: subscription.email.clone(),
            subject: rendered.subject.clone(),
            html: rendered.html,
            text: rendered.text,
            unsubscribe_url: Some(digest.unsubscribe_url),
        };

        let mut log = NewSendLog {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id,
            email: subscription.email.clone(),
            subject: rendered.subject,
            status: SendStatus::Sent,
            provider_message_id: None,
            error: None,
        };

        match self.email.send(&email).await {
            Ok(sent) => {
                log.provider_message_id = Some(sent.message_id.clone());
                // The email is out; bookkeeping failures must not turn it into a failure
                if let Err(e) = self.send_logs.create(&log).await {
                    tracing::error!(error = %e, subscription_id = %subscription.id, "Failed to write send log");
                }
                if let Err(e) = self.subscriptions.mark_sent(&subscription.id, now).await {
                    tracing::error!(error = %e, subscription_id = %subscription.id, "Failed to stamp last_sent_at");
                }

                tracing::info!(
                    subscription_id = %subscription.id,
                    message_id = %sent.message_id,
                    "Digest sent"
                );

                Ok(DeliveryOutcome {
                    subscription_id: subscription.id,
                    status: DeliveryStatus::Sent,
                    message_id: Some(sent.message_id),
                })
            }
            Err(e) => {
                log.status = SendStatus::Failed;
                log.error = Some(e.to_string());
                if let Err(log_err) = self.send_logs.create(&log).await {
                    tracing::error!(error = %log_err, subscription_id = %subscription.id, "Failed to write send log");
                }
                Err(e.into())
            }
        }
    }
}
