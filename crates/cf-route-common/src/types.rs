//! Remote entities exchanged with the Cloud Controller.

use serde::{Deserialize, Serialize};

/// A route as the Cloud Controller reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntity {
    /// Remote-assigned route GUID
    pub id: String,
    /// Domain GUID
    pub domain_id: String,
    /// Space GUID
    pub space_id: String,
    /// Host part of an HTTP route
    pub hostname: Option<String>,
    /// Port of a TCP route (assigned by the server for random-port routes)
    pub port: Option<u16>,
    /// Path segment of an HTTP route
    pub path: Option<String>,
}

/// Fields sent when creating a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub domain_id: String,
    pub space_id: String,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

impl RouteRequest {
    /// Creates a request with only the tenancy references set.
    pub fn new(domain_id: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            space_id: space_id.into(),
            ..Default::default()
        }
    }
}

/// Fields that can be changed on an existing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub id: String,
    pub domain_id: String,
    pub space_id: String,
    pub hostname: Option<String>,
}

/// A binding of a route to an application, as listed by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMapping {
    /// Application GUID
    pub app_id: String,
    /// Application port, when the platform reports one
    pub app_port: Option<u16>,
    /// Route mapping GUID
    pub mapping_id: String,
}

/// A shared or private domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    /// Fully qualified domain name (e.g., "apps.example.com")
    pub name: String,
}

impl Domain {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
