//! Private Domain Access Manager

use std::sync::Arc;

use cf_route_common::{parse_id, DomainApi};
use tracing::{debug, info, instrument};

use crate::error::RouteMgrResult;
use crate::types::PrivateDomainAccess;

/// Manages an organization's access to private domains.
///
/// An access has no remote GUID; it is identified by `<org_id>/<domain_id>`.
pub struct PrivateDomainAccessMgr {
    domains: Arc<dyn DomainApi>,
}

impl PrivateDomainAccessMgr {
    pub fn new(domains: Arc<dyn DomainApi>) -> Self {
        Self { domains }
    }

    /// Grant `org_id` access to `domain_id`
    #[instrument(skip(self))]
    pub async fn create(&self, org_id: &str, domain_id: &str) -> RouteMgrResult<PrivateDomainAccess> {
        self.domains
            .create_private_domain_access(org_id, domain_id)
            .await?;
        let access = PrivateDomainAccess::new(org_id, domain_id);
        info!("Granted private domain access {}", access.id);
        Ok(access)
    }

    /// Look up an access by id. Returns `None` once the access is gone.
    #[instrument(skip(self))]
    pub async fn read(&self, id: &str) -> RouteMgrResult<Option<PrivateDomainAccess>> {
        let (org_id, domain_id) = parse_id(id)?;

        let found = match self.domains.has_private_domain_access(&org_id, &domain_id).await {
            Ok(found) => found,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e.into()),
        };

        if !found {
            info!("Private domain access {} no longer exists", id);
            return Ok(None);
        }
        Ok(Some(PrivateDomainAccess::new(org_id, domain_id)))
    }

    /// Revoke an access. An access that is already gone counts as revoked.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> RouteMgrResult<()> {
        let (org_id, domain_id) = parse_id(id)?;

        match self
            .domains
            .delete_private_domain_access(&org_id, &domain_id)
            .await
        {
            Ok(()) => info!("Revoked private domain access {}", id),
            Err(e) if e.is_not_found() => debug!("Private domain access {} already revoked", id),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Adopt an access by id. Only the id shape is checked here; existence
    /// is established by the following read.
    pub fn import(&self, id: &str) -> RouteMgrResult<PrivateDomainAccess> {
        let (org_id, domain_id) = parse_id(id)?;
        Ok(PrivateDomainAccess::new(org_id, domain_id))
    }
}
