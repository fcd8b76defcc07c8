//! Type definitions for the route manager

use cf_route_common::{compute_id, RouteEntity, RouteRequest};
use serde::{Deserialize, Serialize};

use crate::attributes;
use crate::target::TargetSet;

/// How a route is addressed. Exactly one mode applies to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAddress {
    /// HTTP route: hostname on the domain, optionally under a path
    Host {
        hostname: String,
        path: Option<String>,
    },
    /// TCP route on a fixed port
    Port(u16),
    /// TCP route on a port chosen by the Cloud Controller
    RandomPort,
}

/// Validated desired state of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub domain_id: String,
    pub space_id: String,
    pub address: RouteAddress,
    pub targets: TargetSet,
}

impl RouteSpec {
    pub fn hostname(&self) -> Option<&str> {
        match &self.address {
            RouteAddress::Host { hostname, .. } => Some(hostname),
            _ => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self.address {
            RouteAddress::Port(port) => Some(port),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match &self.address {
            RouteAddress::Host { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    pub fn random_port(&self) -> bool {
        self.address == RouteAddress::RandomPort
    }

    /// Builds the creation request and the random-port flag
    pub fn to_request(&self) -> (RouteRequest, bool) {
        let request = RouteRequest {
            hostname: self.hostname().map(str::to_string),
            port: self.port(),
            path: self.path().map(str::to_string),
            ..RouteRequest::new(self.domain_id.clone(), self.space_id.clone())
        };
        (request, self.random_port())
    }

    /// Returns the first attribute fixed at creation that differs from
    /// `prior`, if any
    pub fn replacement_field(&self, prior: &RouteState) -> Option<&'static str> {
        if self.random_port() != prior.random_port {
            return Some(attributes::RANDOM_PORT);
        }
        if !self.random_port() && self.port() != prior.port {
            return Some(attributes::PORT);
        }
        if self.path() != prior.path.as_deref() {
            return Some(attributes::PATH);
        }
        None
    }

    /// Returns true if an in-place route update is needed to reach `self`
    pub fn differs_in_place(&self, prior: &RouteState) -> bool {
        self.domain_id != prior.domain_id
            || self.space_id != prior.space_id
            || self.hostname() != prior.hostname.as_deref()
    }
}

/// Recorded state of a managed route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteState {
    pub id: String,
    pub domain_id: String,
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub random_port: bool,
    pub endpoint: String,
    #[serde(default, rename = "target")]
    pub targets: TargetSet,
}

impl RouteState {
    /// Builds state from a remote route and its derived endpoint
    pub fn from_entity(route: RouteEntity, endpoint: String, random_port: bool) -> Self {
        Self {
            id: route.id,
            domain_id: route.domain_id,
            space_id: route.space_id,
            hostname: route.hostname.filter(|h| !h.is_empty()),
            port: route.port.filter(|p| *p > 0),
            path: route.path.filter(|p| !p.is_empty()),
            random_port,
            endpoint,
            targets: TargetSet::new(),
        }
    }

    /// Overwrites the route attributes with a fresh remote view, keeping
    /// targets and the random-port flag
    pub fn refresh_from(&mut self, route: RouteEntity, endpoint: String) {
        let targets = std::mem::take(&mut self.targets);
        *self = Self {
            targets,
            ..Self::from_entity(route, endpoint, self.random_port)
        };
    }
}

/// An organization's access to a private domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDomainAccess {
    /// Composite id `<org_id>/<domain_id>`
    pub id: String,
    pub org_id: String,
    pub domain_id: String,
}

impl PrivateDomainAccess {
    pub fn new(org_id: impl Into<String>, domain_id: impl Into<String>) -> Self {
        let org_id = org_id.into();
        let domain_id = domain_id.into();
        Self {
            id: compute_id(&org_id, &domain_id),
            org_id,
            domain_id,
        }
    }
}
