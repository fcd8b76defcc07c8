//! Route and private domain access management for Cloud Foundry
//!
//! Keeps the application mappings of a route in line with a desired target
//! set, derives route endpoints, and implements the create, read, update,
//! delete and import lifecycle of route and private domain access resources
//! on top of the remote client traits in `cf-route-common`.

pub mod attributes;
pub mod config;
mod desired;
mod domain_access_mgr;
mod endpoint;
mod error;
mod reconciler;
pub mod report;
mod route_mgr;
mod target;
mod types;

pub use config::RouteMgrConfig;
pub use desired::{DesiredRoute, DesiredTarget};
pub use domain_access_mgr::PrivateDomainAccessMgr;
pub use endpoint::{derive_endpoint, resolve_endpoint};
pub use error::{RouteMgrError, RouteMgrResult};
pub use reconciler::{ReconcileError, RouteTargetReconciler, TargetOp, TargetPlan};
pub use report::{RouteAction, RoutePlan};
pub use route_mgr::RouteMgr;
pub use target::{DuplicateTarget, Target, TargetKey, TargetSet, DEFAULT_APP_PORT};
pub use types::{PrivateDomainAccess, RouteAddress, RouteSpec, RouteState};
