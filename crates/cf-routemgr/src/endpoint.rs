//! Endpoint derivation

use cf_route_common::{DomainApi, RouteEntity};
use tracing::debug;

use crate::attributes;
use crate::error::{RouteMgrError, RouteMgrResult};

/// Builds the human-readable address of a route.
///
/// A positive port wins: `"{domain}:{port}"`. Otherwise a non-empty hostname
/// is required and the result is `"{hostname}.{domain}"`, followed by
/// `"/{path}"` when the path is non-empty.
pub fn derive_endpoint(
    domain_name: &str,
    hostname: Option<&str>,
    port: Option<u16>,
    path: Option<&str>,
) -> RouteMgrResult<String> {
    if let Some(port) = port.filter(|p| *p > 0) {
        return Ok(format!("{}:{}", domain_name, port));
    }

    let hostname = hostname.filter(|h| !h.is_empty()).ok_or_else(|| {
        RouteMgrError::contract_violation(
            attributes::HOSTNAME,
            "route has neither a hostname nor a port",
        )
    })?;

    match path.filter(|p| !p.is_empty()) {
        None => Ok(format!("{}.{}", hostname, domain_name)),
        Some(path) => Ok(format!("{}.{}/{}", hostname, domain_name, path)),
    }
}

/// Resolves the route's domain name and derives its endpoint
pub async fn resolve_endpoint(domains: &dyn DomainApi, route: &RouteEntity) -> RouteMgrResult<String> {
    let domain = domains.find_domain(&route.domain_id).await?;
    let endpoint = derive_endpoint(
        &domain.name,
        route.hostname.as_deref(),
        route.port,
        route.path.as_deref(),
    )?;
    debug!("Route {} endpoint is {}", route.id, endpoint);
    Ok(endpoint)
}
