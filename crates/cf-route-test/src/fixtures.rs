//! Test fixtures for common Cloud Controller setups
//!
//! Provides seeded controllers and route shapes reused across manager tests

use cf_route_common::{RouteEntity, RouteRequest};

use crate::FakeCloudController;

/// Shared HTTP domain
pub const HTTP_DOMAIN_ID: &str = "dom-http";
pub const HTTP_DOMAIN_NAME: &str = "example.com";

/// TCP router domain
pub const TCP_DOMAIN_ID: &str = "dom-tcp";
pub const TCP_DOMAIN_NAME: &str = "tcp.example.com";

/// Private domain used by access tests
pub const PRIVATE_DOMAIN_ID: &str = "dom-private";
pub const PRIVATE_DOMAIN_NAME: &str = "internal.example.org";

/// Default space and organization
pub const SPACE_ID: &str = "space-1";
pub const ORG_ID: &str = "org-1";

/// Controller seeded with the HTTP, TCP and private domains
pub fn standard_controller() -> FakeCloudController {
    FakeCloudController::new()
        .with_domain(HTTP_DOMAIN_ID, HTTP_DOMAIN_NAME)
        .with_domain(TCP_DOMAIN_ID, TCP_DOMAIN_NAME)
        .with_domain(PRIVATE_DOMAIN_ID, PRIVATE_DOMAIN_NAME)
}

/// Common route shapes
pub mod route_fixtures {
    use super::*;

    /// HTTP route request on the shared domain
    pub fn http_request(hostname: &str) -> RouteRequest {
        RouteRequest {
            hostname: Some(hostname.to_string()),
            ..RouteRequest::new(HTTP_DOMAIN_ID, SPACE_ID)
        }
    }

    /// HTTP route request with a path segment
    pub fn http_request_with_path(hostname: &str, path: &str) -> RouteRequest {
        RouteRequest {
            path: Some(path.to_string()),
            ..http_request(hostname)
        }
    }

    /// TCP route request with a fixed port
    pub fn tcp_request(port: u16) -> RouteRequest {
        RouteRequest {
            port: Some(port),
            ..RouteRequest::new(TCP_DOMAIN_ID, SPACE_ID)
        }
    }

    /// Existing HTTP route as the controller reports it
    pub fn http_route(id: &str, hostname: &str) -> RouteEntity {
        RouteEntity {
            id: id.to_string(),
            domain_id: HTTP_DOMAIN_ID.to_string(),
            space_id: SPACE_ID.to_string(),
            hostname: Some(hostname.to_string()),
            port: None,
            path: None,
        }
    }
}

/// Controller holding one HTTP route `route_id` bound to the given
/// `(app_id, app_port, mapping_id)` triples
pub fn controller_with_mapped_route(
    route_id: &str,
    hostname: &str,
    mappings: &[(&str, u16, &str)],
) -> FakeCloudController {
    let cc = standard_controller();
    cc.seed_route(route_fixtures::http_route(route_id, hostname));
    for (app_id, port, mapping_id) in mappings {
        cc.seed_mapping(route_id, app_id, Some(*port), mapping_id);
    }
    cc
}
