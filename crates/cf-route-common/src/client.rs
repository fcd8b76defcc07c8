//! Remote client traits.
//!
//! The managers depend only on these traits. A concrete Cloud Controller
//! client (HTTP, auth, pagination, retries) lives outside this workspace;
//! tests use the in-memory implementation from `cf-route-test`.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{Domain, RouteEntity, RouteMapping, RouteRequest, RouteUpdate};

/// Route and route-mapping operations of the Cloud Controller.
///
/// Each call is a single all-or-nothing unit of work. Implementations must
/// not retry internally.
#[async_trait]
pub trait RouteApi: Send + Sync {
    /// Creates a route. When `random_port` is set the server picks the port.
    async fn create_route(&self, request: RouteRequest, random_port: bool) -> ApiResult<RouteEntity>;

    /// Reads a route by id. Absent routes yield `ApiError::NotFound`.
    async fn read_route(&self, id: &str) -> ApiResult<RouteEntity>;

    /// Updates domain, space and hostname of an existing route.
    async fn update_route(&self, update: RouteUpdate) -> ApiResult<RouteEntity>;

    /// Deletes a route together with its mappings.
    async fn delete_route(&self, id: &str) -> ApiResult<()>;

    /// Binds a route to an application and returns the mapping id.
    async fn create_route_mapping(
        &self,
        route_id: &str,
        app_id: &str,
        port: Option<u16>,
    ) -> ApiResult<String>;

    /// Removes a route mapping.
    ///
    /// Deleting an already-absent mapping may report `ApiError::NotFound`;
    /// callers treat that as success.
    async fn delete_route_mapping(&self, mapping_id: &str) -> ApiResult<()>;

    /// Lists the mappings currently bound to a route.
    async fn read_route_mappings_by_route(&self, route_id: &str) -> ApiResult<Vec<RouteMapping>>;
}

/// Domain operations of the Cloud Controller.
#[async_trait]
pub trait DomainApi: Send + Sync {
    /// Resolves a domain id to the domain (and its name).
    async fn find_domain(&self, domain_id: &str) -> ApiResult<Domain>;

    /// Grants an organization access to a private domain.
    async fn create_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<()>;

    /// Returns true if the organization has access to the private domain.
    async fn has_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<bool>;

    /// Revokes an organization's access to a private domain.
    async fn delete_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<()>;
}
