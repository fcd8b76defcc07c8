//! Route Manager - route resource lifecycle and target mappings

use std::sync::Arc;

use cf_route_common::{DomainApi, RouteApi, RouteEntity, RouteUpdate};
use tracing::{debug, error, info, instrument, warn};

use crate::endpoint::resolve_endpoint;
use crate::error::{RouteMgrError, RouteMgrResult};
use crate::reconciler::RouteTargetReconciler;
use crate::target::{Target, TargetSet, DEFAULT_APP_PORT};
use crate::types::{RouteSpec, RouteState};

/// Route Manager
///
/// Implements create, read, update, delete and import of route resources
/// against the injected Cloud Controller clients.
pub struct RouteMgr {
    routes: Arc<dyn RouteApi>,
    domains: Arc<dyn DomainApi>,
    /// Port applied to observed mappings that report none
    default_app_port: u16,
}

impl RouteMgr {
    /// Create a new RouteMgr instance
    pub fn new(routes: Arc<dyn RouteApi>, domains: Arc<dyn DomainApi>) -> Self {
        Self {
            routes,
            domains,
            default_app_port: DEFAULT_APP_PORT,
        }
    }

    /// Overrides the application port assumed for observed mappings
    pub fn with_default_app_port(mut self, port: u16) -> Self {
        self.default_app_port = port;
        self
    }

    fn reconciler(&self) -> RouteTargetReconciler<'_> {
        RouteTargetReconciler::new(self.routes.as_ref())
    }

    /// Create a route and map its targets.
    ///
    /// Once the route exists remotely, any later failure deletes it again
    /// before the error is returned. If that delete fails too the result is
    /// [`RouteMgrError::Unrecoverable`].
    #[instrument(skip(self, spec), fields(domain = %spec.domain_id, targets = spec.targets.len()))]
    pub async fn create(&self, spec: &RouteSpec) -> RouteMgrResult<RouteState> {
        let (request, random_port) = spec.to_request();
        let route = self.routes.create_route(request, random_port).await?;
        let route_id = route.id.clone();
        info!("Created route {}", route_id);

        match self.populate(route, random_port, &spec.targets).await {
            Ok(state) => Ok(state),
            Err(cause) => Err(self.roll_back(&route_id, cause).await),
        }
    }

    async fn populate(
        &self,
        route: RouteEntity,
        random_port: bool,
        targets: &TargetSet,
    ) -> RouteMgrResult<RouteState> {
        let endpoint = resolve_endpoint(self.domains.as_ref(), &route).await?;
        let mut state = RouteState::from_entity(route, endpoint, random_port);
        if !targets.is_empty() {
            state.targets = self.reconciler().converge(&state.id, targets).await?;
        }
        Ok(state)
    }

    async fn roll_back(&self, route_id: &str, cause: RouteMgrError) -> RouteMgrError {
        warn!("Create of route {} failed, deleting it: {}", route_id, cause);
        match self.routes.delete_route(route_id).await {
            Ok(()) => {
                info!("Rolled back route {}", route_id);
                cause
            }
            Err(rollback) => {
                error!("Rollback of route {} failed: {}", route_id, rollback);
                RouteMgrError::Unrecoverable {
                    route_id: route_id.to_string(),
                    cause: Box::new(cause),
                    rollback,
                }
            }
        }
    }

    /// Read the remote state of a route.
    ///
    /// Returns `None` if the route no longer exists. With `track_targets`
    /// the targets are the mappings observed remotely, otherwise empty. The
    /// random-port flag cannot be observed and is reported unset.
    #[instrument(skip(self))]
    pub async fn read(&self, id: &str, track_targets: bool) -> RouteMgrResult<Option<RouteState>> {
        let route = match self.routes.read_route(id).await {
            Ok(route) => route,
            Err(e) if e.is_not_found() => {
                info!("Route {} no longer exists", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let endpoint = resolve_endpoint(self.domains.as_ref(), &route).await?;
        let mut state = RouteState::from_entity(route, endpoint, false);
        if track_targets {
            state.targets = self.observe_targets(id).await?;
        }
        Ok(Some(state))
    }

    /// Read a route with respect to previously recorded state.
    ///
    /// Keeps the recorded random-port flag and tracks targets if any were
    /// recorded.
    pub async fn refresh(&self, prior: &RouteState) -> RouteMgrResult<Option<RouteState>> {
        let state = self.read(&prior.id, !prior.targets.is_empty()).await?;
        Ok(state.map(|state| RouteState {
            random_port: prior.random_port,
            ..state
        }))
    }

    /// Adopt an existing route. A missing route is an error here.
    #[instrument(skip(self))]
    pub async fn import(&self, id: &str) -> RouteMgrResult<RouteState> {
        let route = self.routes.read_route(id).await?;
        let endpoint = resolve_endpoint(self.domains.as_ref(), &route).await?;
        let mut state = RouteState::from_entity(route, endpoint, false);
        state.targets = self.observe_targets(id).await?;
        info!("Imported route {} with {} target(s)", id, state.targets.len());
        Ok(state)
    }

    async fn observe_targets(&self, id: &str) -> RouteMgrResult<TargetSet> {
        let mappings = self.routes.read_route_mappings_by_route(id).await?;
        let mut targets = TargetSet::new();
        for mapping in &mappings {
            let target = Target::from_mapping(mapping, self.default_app_port);
            if let Err(e) = targets.insert(target) {
                // Two remote mappings of one app and port; keep the first
                debug!("Ignoring mapping {}: {}", mapping.mapping_id, e);
            }
        }
        Ok(targets)
    }

    /// Move a route from `prior` to `desired`.
    ///
    /// Port, path and random-port cannot change in place. Domain, space and
    /// hostname changes update the route; target changes are reconciled.
    ///
    /// The route update is applied before the targets are reconciled. An
    /// error after that point leaves the route changed remotely while
    /// `prior` no longer describes it, so callers must [`Self::refresh`]
    /// before retrying.
    #[instrument(skip(self, prior, desired), fields(route = %prior.id))]
    pub async fn update(&self, prior: &RouteState, desired: &RouteSpec) -> RouteMgrResult<RouteState> {
        if let Some(field) = desired.replacement_field(prior) {
            return Err(RouteMgrError::requires_replacement(&prior.id, field));
        }

        let mut state = prior.clone();

        if desired.differs_in_place(prior) {
            let update = RouteUpdate {
                id: prior.id.clone(),
                domain_id: desired.domain_id.clone(),
                space_id: desired.space_id.clone(),
                hostname: desired.hostname().map(str::to_string),
            };
            let route = self.routes.update_route(update).await?;
            let endpoint = resolve_endpoint(self.domains.as_ref(), &route).await?;
            state.refresh_from(route, endpoint);
            info!("Updated route {}", prior.id);
        }

        if !desired.targets.same_keys(&prior.targets) {
            state.targets = self
                .reconciler()
                .reconcile(&prior.id, &prior.targets, &desired.targets)
                .await?;
        }

        Ok(state)
    }

    /// Unmap all targets and delete the route. A route that is already gone
    /// counts as deleted.
    #[instrument(skip(self, state), fields(route = %state.id))]
    pub async fn delete(&self, state: &RouteState) -> RouteMgrResult<()> {
        if !state.targets.is_empty() {
            self.reconciler().teardown(&state.id, &state.targets).await?;
        }

        match self.routes.delete_route(&state.id).await {
            Ok(()) => info!("Deleted route {}", state.id),
            Err(e) if e.is_not_found() => debug!("Route {} already deleted", state.id),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
