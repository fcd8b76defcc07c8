//! In-memory Cloud Controller
//!
//! Implements [`RouteApi`] and [`DomainApi`] over plain collections. Every
//! call is appended to a call log before it is evaluated, so tests can assert
//! both what was attempted and in which order. Failures are injected with
//! fault rules matched against the recorded call.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use cf_route_common::{
    ApiError, ApiResult, Domain, DomainApi, EntityKind, RouteApi, RouteEntity, RouteMapping,
    RouteRequest, RouteUpdate,
};
use parking_lot::Mutex;
use tracing::debug;

/// First port handed out for random-port routes.
pub const RANDOM_PORT_START: u16 = 61000;

/// A call received by the fake controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateRoute {
        domain_id: String,
        hostname: Option<String>,
        port: Option<u16>,
        path: Option<String>,
        random_port: bool,
    },
    ReadRoute(String),
    UpdateRoute {
        id: String,
        domain_id: String,
        space_id: String,
        hostname: Option<String>,
    },
    DeleteRoute(String),
    CreateMapping {
        route_id: String,
        app_id: String,
        port: Option<u16>,
    },
    DeleteMapping(String),
    ReadMappings(String),
    FindDomain(String),
    CreatePrivateDomainAccess { org_id: String, domain_id: String },
    HasPrivateDomainAccess { org_id: String, domain_id: String },
    DeletePrivateDomainAccess { org_id: String, domain_id: String },
}

impl ApiCall {
    /// Returns true for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiCall::ReadRoute(_)
                | ApiCall::ReadMappings(_)
                | ApiCall::FindDomain(_)
                | ApiCall::HasPrivateDomainAccess { .. }
        )
    }
}

type CallMatcher = Box<dyn Fn(&ApiCall) -> bool + Send + Sync>;

struct FaultRule {
    matcher: CallMatcher,
    error: ApiError,
    /// `None` fails every matching call
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct StoredMapping {
    route_id: String,
    mapping: RouteMapping,
}

#[derive(Default)]
struct ControllerState {
    domains: BTreeMap<String, Domain>,
    routes: BTreeMap<String, RouteEntity>,
    /// Insertion-ordered so listings are deterministic
    mappings: Vec<StoredMapping>,
    private_access: BTreeSet<(String, String)>,
    calls: Vec<ApiCall>,
    faults: Vec<FaultRule>,
    next_route: u64,
    next_mapping: u64,
    next_random_port: u16,
}

impl ControllerState {
    /// Records the call and returns the injected error, if a rule matches.
    fn record(&mut self, call: ApiCall) -> ApiResult<()> {
        debug!("fake controller call: {:?}", call);

        let mut injected = None;
        for rule in self.faults.iter_mut() {
            if !(rule.matcher)(&call) {
                continue;
            }
            if let Some(n) = rule.remaining.as_mut() {
                if *n == 0 {
                    continue;
                }
                *n -= 1;
            }
            injected = Some(rule.error.clone());
            break;
        }
        self.faults.retain(|rule| rule.remaining != Some(0));
        self.calls.push(call);

        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory Cloud Controller.
pub struct FakeCloudController {
    state: Mutex<ControllerState>,
}

impl FakeCloudController {
    /// Creates an empty controller.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControllerState {
                next_random_port: RANDOM_PORT_START,
                ..Default::default()
            }),
        }
    }

    /// Adds a domain (builder form).
    pub fn with_domain(self, id: &str, name: &str) -> Self {
        self.add_domain(id, name);
        self
    }

    /// Adds a domain.
    pub fn add_domain(&self, id: &str, name: &str) {
        self.state
            .lock()
            .domains
            .insert(id.to_string(), Domain::new(id, name));
    }

    /// Stores a route directly, without recording a call.
    pub fn seed_route(&self, route: RouteEntity) {
        self.state.lock().routes.insert(route.id.clone(), route);
    }

    /// Stores a route mapping directly, without recording a call.
    pub fn seed_mapping(&self, route_id: &str, app_id: &str, app_port: Option<u16>, mapping_id: &str) {
        self.state.lock().mappings.push(StoredMapping {
            route_id: route_id.to_string(),
            mapping: RouteMapping {
                app_id: app_id.to_string(),
                app_port,
                mapping_id: mapping_id.to_string(),
            },
        });
    }

    /// Grants private domain access directly, without recording a call.
    pub fn seed_private_access(&self, org_id: &str, domain_id: &str) {
        self.state
            .lock()
            .private_access
            .insert((org_id.to_string(), domain_id.to_string()));
    }

    /// Fails the next call accepted by `matcher` with `error`.
    pub fn fail_next<F>(&self, matcher: F, error: ApiError)
    where
        F: Fn(&ApiCall) -> bool + Send + Sync + 'static,
    {
        self.fail_times(matcher, error, 1);
    }

    /// Fails the next `times` calls accepted by `matcher` with `error`.
    pub fn fail_times<F>(&self, matcher: F, error: ApiError, times: usize)
    where
        F: Fn(&ApiCall) -> bool + Send + Sync + 'static,
    {
        self.state.lock().faults.push(FaultRule {
            matcher: Box::new(matcher),
            error,
            remaining: Some(times),
        });
    }

    /// Fails every call accepted by `matcher` with `error`.
    pub fn fail_always<F>(&self, matcher: F, error: ApiError)
    where
        F: Fn(&ApiCall) -> bool + Send + Sync + 'static,
    {
        self.state.lock().faults.push(FaultRule {
            matcher: Box::new(matcher),
            error,
            remaining: None,
        });
    }

    /// Fails the next mapping creation for `app_id`.
    pub fn fail_create_mapping_for(&self, app_id: &str, error: ApiError) {
        let app_id = app_id.to_string();
        self.fail_next(
            move |call| matches!(call, ApiCall::CreateMapping { app_id: a, .. } if *a == app_id),
            error,
        );
    }

    /// Fails the next deletion of `mapping_id`.
    pub fn fail_delete_mapping(&self, mapping_id: &str, error: ApiError) {
        let mapping_id = mapping_id.to_string();
        self.fail_next(
            move |call| matches!(call, ApiCall::DeleteMapping(m) if *m == mapping_id),
            error,
        );
    }

    /// Drops all pending fault rules.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Returns calls that change remote state.
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_mutation).collect()
    }

    /// Forgets recorded calls, keeping remote state.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Returns true if the route exists.
    pub fn has_route(&self, id: &str) -> bool {
        self.state.lock().routes.contains_key(id)
    }

    /// Returns the number of stored routes.
    pub fn route_count(&self) -> usize {
        self.state.lock().routes.len()
    }

    /// Returns the mappings bound to `route_id`, in creation order.
    pub fn mappings_for(&self, route_id: &str) -> Vec<RouteMapping> {
        self.state
            .lock()
            .mappings
            .iter()
            .filter(|m| m.route_id == route_id)
            .map(|m| m.mapping.clone())
            .collect()
    }

    /// Returns true if the organization has access to the private domain.
    pub fn has_private_access(&self, org_id: &str, domain_id: &str) -> bool {
        self.state
            .lock()
            .private_access
            .contains(&(org_id.to_string(), domain_id.to_string()))
    }
}

impl Default for FakeCloudController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteApi for FakeCloudController {
    async fn create_route(&self, request: RouteRequest, random_port: bool) -> ApiResult<RouteEntity> {
        let mut state = self.state.lock();
        state.record(ApiCall::CreateRoute {
            domain_id: request.domain_id.clone(),
            hostname: request.hostname.clone(),
            port: request.port,
            path: request.path.clone(),
            random_port,
        })?;

        if !state.domains.contains_key(&request.domain_id) {
            return Err(ApiError::not_found(EntityKind::Domain, request.domain_id));
        }

        let port = if random_port {
            let port = state.next_random_port;
            state.next_random_port += 1;
            Some(port)
        } else {
            request.port
        };

        state.next_route += 1;
        let route = RouteEntity {
            id: format!("route-{}", state.next_route),
            domain_id: request.domain_id,
            space_id: request.space_id,
            hostname: request.hostname,
            port,
            path: request.path,
        };
        state.routes.insert(route.id.clone(), route.clone());
        Ok(route)
    }

    async fn read_route(&self, id: &str) -> ApiResult<RouteEntity> {
        let mut state = self.state.lock();
        state.record(ApiCall::ReadRoute(id.to_string()))?;

        state
            .routes
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(EntityKind::Route, id))
    }

    async fn update_route(&self, update: RouteUpdate) -> ApiResult<RouteEntity> {
        let mut state = self.state.lock();
        state.record(ApiCall::UpdateRoute {
            id: update.id.clone(),
            domain_id: update.domain_id.clone(),
            space_id: update.space_id.clone(),
            hostname: update.hostname.clone(),
        })?;

        if !state.domains.contains_key(&update.domain_id) {
            return Err(ApiError::not_found(EntityKind::Domain, update.domain_id));
        }
        let route = state
            .routes
            .get_mut(&update.id)
            .ok_or_else(|| ApiError::not_found(EntityKind::Route, update.id.clone()))?;

        route.domain_id = update.domain_id;
        route.space_id = update.space_id;
        route.hostname = update.hostname;
        Ok(route.clone())
    }

    async fn delete_route(&self, id: &str) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.record(ApiCall::DeleteRoute(id.to_string()))?;

        if state.routes.remove(id).is_none() {
            return Err(ApiError::not_found(EntityKind::Route, id));
        }
        state.mappings.retain(|m| m.route_id != id);
        Ok(())
    }

    async fn create_route_mapping(
        &self,
        route_id: &str,
        app_id: &str,
        port: Option<u16>,
    ) -> ApiResult<String> {
        let mut state = self.state.lock();
        state.record(ApiCall::CreateMapping {
            route_id: route_id.to_string(),
            app_id: app_id.to_string(),
            port,
        })?;

        if !state.routes.contains_key(route_id) {
            return Err(ApiError::not_found(EntityKind::Route, route_id));
        }

        state.next_mapping += 1;
        let mapping_id = format!("mapping-{}", state.next_mapping);
        state.mappings.push(StoredMapping {
            route_id: route_id.to_string(),
            mapping: RouteMapping {
                app_id: app_id.to_string(),
                app_port: port,
                mapping_id: mapping_id.clone(),
            },
        });
        Ok(mapping_id)
    }

    async fn delete_route_mapping(&self, mapping_id: &str) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.record(ApiCall::DeleteMapping(mapping_id.to_string()))?;

        let before = state.mappings.len();
        state.mappings.retain(|m| m.mapping.mapping_id != mapping_id);
        if state.mappings.len() == before {
            return Err(ApiError::not_found(EntityKind::RouteMapping, mapping_id));
        }
        Ok(())
    }

    async fn read_route_mappings_by_route(&self, route_id: &str) -> ApiResult<Vec<RouteMapping>> {
        let mut state = self.state.lock();
        state.record(ApiCall::ReadMappings(route_id.to_string()))?;

        if !state.routes.contains_key(route_id) {
            return Err(ApiError::not_found(EntityKind::Route, route_id));
        }
        Ok(state
            .mappings
            .iter()
            .filter(|m| m.route_id == route_id)
            .map(|m| m.mapping.clone())
            .collect())
    }
}

#[async_trait]
impl DomainApi for FakeCloudController {
    async fn find_domain(&self, domain_id: &str) -> ApiResult<Domain> {
        let mut state = self.state.lock();
        state.record(ApiCall::FindDomain(domain_id.to_string()))?;

        state
            .domains
            .get(domain_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(EntityKind::Domain, domain_id))
    }

    async fn create_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.record(ApiCall::CreatePrivateDomainAccess {
            org_id: org_id.to_string(),
            domain_id: domain_id.to_string(),
        })?;

        if !state.domains.contains_key(domain_id) {
            return Err(ApiError::not_found(EntityKind::Domain, domain_id));
        }
        state
            .private_access
            .insert((org_id.to_string(), domain_id.to_string()));
        Ok(())
    }

    async fn has_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<bool> {
        let mut state = self.state.lock();
        state.record(ApiCall::HasPrivateDomainAccess {
            org_id: org_id.to_string(),
            domain_id: domain_id.to_string(),
        })?;

        Ok(state
            .private_access
            .contains(&(org_id.to_string(), domain_id.to_string())))
    }

    async fn delete_private_domain_access(&self, org_id: &str, domain_id: &str) -> ApiResult<()> {
        let mut state = self.state.lock();
        state.record(ApiCall::DeletePrivateDomainAccess {
            org_id: org_id.to_string(),
            domain_id: domain_id.to_string(),
        })?;

        if !state
            .private_access
            .remove(&(org_id.to_string(), domain_id.to_string()))
        {
            return Err(ApiError::not_found(
                EntityKind::PrivateDomainAccess,
                format!("{}/{}", org_id, domain_id),
            ));
        }
        Ok(())
    }
}
