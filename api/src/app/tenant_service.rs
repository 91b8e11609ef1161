//! Tenant service
//!
//! Tenant listing for the portal's tenant switcher.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{Retailer, TenantId, TenantWithRetailers};
use crate::domain::ports::TenantRepository;
use crate::error::{AppError, DomainError};

/// Service for reading tenants and their retailers
pub struct TenantService<TR>
where
    TR: TenantRepository,
{
    tenants: Arc<TR>,
}

impl<TR> TenantService<TR>
where
    TR: TenantRepository,
{
    pub fn new(tenants: Arc<TR>) -> Self {
        Self { tenants }
    }

    /// Active tenants with their retailers, sorted by tenant name
    pub async fn list(&self) -> Result<Vec<TenantWithRetailers>, AppError> {
        let tenants = self.tenants.find_active().await?;
        let ids: Vec<TenantId> = tenants.iter().map(|t| t.id).collect();
        let mut by_tenant = group_retailers(self.tenants.find_retailers(&ids).await?);

        let mut listing: Vec<TenantWithRetailers> = tenants
            .into_iter()
            .map(|tenant| TenantWithRetailers {
                retailers: by_tenant.remove(&tenant.id).unwrap_or_default(),
                tenant,
            })
            .collect();
        listing.sort_by(|a, b| a.tenant.name.to_lowercase().cmp(&b.tenant.name.to_lowercase()));

        Ok(listing)
    }

    /// A single tenant with its retailers
    pub async fn get(&self, id: &TenantId) -> Result<TenantWithRetailers, AppError> {
        let tenant = self
            .tenants
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Tenant {}", id)))?;

        let retailers = self.tenants.find_retailers(&[tenant.id]).await?;

        Ok(TenantWithRetailers { tenant, retailers })
    }
}

fn group_retailers(retailers: Vec<Retailer>) -> HashMap<TenantId, Vec<Retailer>> {
    let mut grouped: HashMap<TenantId, Vec<Retailer>> = HashMap::new();
    for retailer in retailers {
        grouped.entry(retailer.tenant_id).or_default().push(retailer);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_retailer, test_tenant_named, InMemoryTenantRepository};

    #[tokio::test]
    async fn list_groups_retailers_under_tenants() {
        let acme = test_tenant_named("Acme Foods");
        let beta = test_tenant_named("beta drinks");
        let repo = InMemoryTenantRepository::new()
            .with_tenant(beta.clone())
            .with_tenant(acme.clone())
            .with_retailer(test_retailer(&acme, "North Mart"))
            .with_retailer(test_retailer(&acme, "South Mart"))
            .with_retailer(test_retailer(&beta, "Corner Shop"));
        let service = TenantService::new(Arc::new(repo));

        let listing = service.list().await.unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].tenant.name, "Acme Foods");
        assert_eq!(listing[0].retailers.len(), 2);
        assert_eq!(listing[1].retailers[0].name, "Corner Shop");
    }

    #[tokio::test]
    async fn list_skips_inactive_tenants() {
        let mut dormant = test_tenant_named("Dormant");
        dormant.active = false;
        let repo = InMemoryTenantRepository::new().with_tenant(dormant);
        let service = TenantService::new(Arc::new(repo));

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_unknown_tenant_is_not_found() {
        let service = TenantService::new(Arc::new(InMemoryTenantRepository::new()));

        let result = service.get(&TenantId::new()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }
}
