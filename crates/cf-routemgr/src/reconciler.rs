//! Route Target Reconciler
//!
//! Drives the remote route mappings of one route from a current target set
//! to a desired one. Remote calls are issued one at a time and every call is
//! awaited before the next. Removals always complete before the first
//! addition, so an application is never briefly bound twice.
//!
//! There is no retry and no rollback here. On the first failing call the
//! reconciler stops and returns a [`ReconcileError`] that names the failing
//! target and carries the set that is materialized remotely at that point.

use std::fmt;

use cf_route_common::{ApiError, RouteApi};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::target::{Target, TargetKey, TargetSet};

/// Remote operation a reconciliation step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOp {
    Create,
    Delete,
}

impl fmt::Display for TargetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOp::Create => f.write_str("create"),
            TargetOp::Delete => f.write_str("delete"),
        }
    }
}

/// Reconciliation stopped at a failing remote call
#[derive(Debug, Error)]
#[error(
    "Failed to {op} route mapping for target {key} on route '{route_id}' \
     after {completed} successful call(s): {source}"
)]
pub struct ReconcileError {
    pub route_id: String,
    pub op: TargetOp,
    /// Key of the target whose call failed
    pub key: TargetKey,
    /// Remote calls that succeeded before the failure
    pub completed: usize,
    /// Targets bound remotely when processing stopped
    pub materialized: TargetSet,
    #[source]
    pub source: ApiError,
}

impl ReconcileError {
    /// Returns true if earlier calls of the same run took effect
    pub fn is_partial(&self) -> bool {
        self.completed > 0
    }
}

/// Difference between a current and a desired target set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetPlan {
    /// Targets present on both sides, carrying the current mapping ids
    pub unchanged: TargetSet,
    /// Current targets absent from the desired set
    pub to_remove: TargetSet,
    /// Desired targets absent from the current set
    pub to_add: TargetSet,
}

impl TargetPlan {
    pub fn compute(current: &TargetSet, desired: &TargetSet) -> Self {
        let mut plan = Self::default();
        for target in current.intersection(desired) {
            plan.unchanged.push_unchecked(target.clone());
        }
        for target in current.difference(desired) {
            plan.to_remove.push_unchecked(target.clone());
        }
        for target in desired.difference(current) {
            plan.to_add.push_unchecked(target.clone());
        }
        plan
    }

    /// Returns true if applying the plan needs no remote call
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.removals().next().is_none()
    }

    /// Removals that need a remote delete
    pub fn removals(&self) -> impl Iterator<Item = &Target> {
        self.to_remove.iter().filter(|t| t.mapping_id().is_some())
    }
}

/// Reconciler bound to one remote client
pub struct RouteTargetReconciler<'a> {
    client: &'a dyn RouteApi,
}

impl<'a> RouteTargetReconciler<'a> {
    pub fn new(client: &'a dyn RouteApi) -> Self {
        Self { client }
    }

    /// Creates a mapping for every desired target, in order.
    ///
    /// On failure the error's `materialized` set holds exactly the targets
    /// created before the failing one.
    #[instrument(skip(self, desired), fields(targets = desired.len()))]
    pub async fn converge(
        &self,
        route_id: &str,
        desired: &TargetSet,
    ) -> Result<TargetSet, ReconcileError> {
        let materialized = self
            .add_targets(route_id, TargetSet::new(), desired, 0)
            .await?;
        info!("Mapped {} target(s) to route {}", materialized.len(), route_id);
        Ok(materialized)
    }

    /// Moves the route from `current` to `desired`.
    ///
    /// Targets present in both keep their mapping id and cause no remote
    /// call. The returned set is the unchanged targets followed by the newly
    /// created ones.
    #[instrument(skip(self, current, desired), fields(current = current.len(), desired = desired.len()))]
    pub async fn reconcile(
        &self,
        route_id: &str,
        current: &TargetSet,
        desired: &TargetSet,
    ) -> Result<TargetSet, ReconcileError> {
        let plan = TargetPlan::compute(current, desired);
        if plan.is_noop() {
            debug!("Targets of route {} already up to date", route_id);
            return Ok(plan.unchanged);
        }

        debug!(
            "Route {}: {} to remove, {} to add, {} unchanged",
            route_id,
            plan.to_remove.len(),
            plan.to_add.len(),
            plan.unchanged.len()
        );

        let removed = match self.remove_targets(route_id, &plan.to_remove).await {
            Ok(removed) => removed,
            Err(failure) => {
                let mut materialized = plan.unchanged.clone();
                for target in plan.to_remove.iter().skip(failure.position) {
                    if target.mapping_id().is_some() {
                        materialized.push_unchecked(target.clone());
                    }
                }
                return Err(failure.into_error(route_id, TargetOp::Delete, materialized));
            }
        };

        let materialized = self
            .add_targets(route_id, plan.unchanged, &plan.to_add, removed)
            .await?;
        info!(
            "Reconciled route {}: {} removed, {} added",
            route_id,
            removed,
            plan.to_add.len()
        );
        Ok(materialized)
    }

    /// Deletes the mapping of every target that has one.
    ///
    /// Targets without a mapping id are skipped. On failure the error's
    /// `materialized` set holds the failing target and those after it.
    #[instrument(skip(self, current), fields(targets = current.len()))]
    pub async fn teardown(&self, route_id: &str, current: &TargetSet) -> Result<(), ReconcileError> {
        match self.remove_targets(route_id, current).await {
            Ok(removed) => {
                info!("Unmapped {} target(s) from route {}", removed, route_id);
                Ok(())
            }
            Err(failure) => {
                let mut materialized = TargetSet::new();
                for target in current.iter().skip(failure.position) {
                    if target.mapping_id().is_some() {
                        materialized.push_unchecked(target.clone());
                    }
                }
                Err(failure.into_error(route_id, TargetOp::Delete, materialized))
            }
        }
    }

    /// Creates mappings for `to_add`, appending each created target to
    /// `materialized`
    async fn add_targets(
        &self,
        route_id: &str,
        mut materialized: TargetSet,
        to_add: &TargetSet,
        mut completed: usize,
    ) -> Result<TargetSet, ReconcileError> {
        for target in to_add {
            match self
                .client
                .create_route_mapping(route_id, &target.app_id, Some(target.port))
                .await
            {
                Ok(mapping_id) => {
                    debug!(
                        "Created route mapping {} to app {} port {}",
                        mapping_id, target.app_id, target.port
                    );
                    materialized.push_unchecked(Target {
                        mapping_id: Some(mapping_id),
                        ..target.clone()
                    });
                    completed += 1;
                }
                Err(source) => {
                    warn!("Failed to map app {} to route {}: {}", target.app_id, route_id, source);
                    return Err(ReconcileError {
                        route_id: route_id.to_string(),
                        op: TargetOp::Create,
                        key: target.key(),
                        completed,
                        materialized,
                        source,
                    });
                }
            }
        }
        Ok(materialized)
    }

    /// Deletes the mapping of each target in order and returns the number of
    /// delete calls that succeeded
    async fn remove_targets(
        &self,
        route_id: &str,
        targets: &TargetSet,
    ) -> Result<usize, RemovalFailure> {
        let mut removed = 0;
        for (position, target) in targets.iter().enumerate() {
            let Some(mapping_id) = target.mapping_id() else {
                debug!(
                    "Ignoring app {} on route {}: no mapping id",
                    target.app_id, route_id
                );
                continue;
            };

            debug!("Deleting route mapping {} to app {}", mapping_id, target.app_id);
            match self.client.delete_route_mapping(mapping_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Route mapping {} already absent", mapping_id);
                }
                Err(source) => {
                    warn!("Failed to delete route mapping {}: {}", mapping_id, source);
                    return Err(RemovalFailure {
                        position,
                        key: target.key(),
                        completed: removed,
                        source,
                    });
                }
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Failure of one delete in a removal run
struct RemovalFailure {
    /// Index of the failing target within the removal set
    position: usize,
    key: TargetKey,
    completed: usize,
    source: ApiError,
}

impl RemovalFailure {
    fn into_error(self, route_id: &str, op: TargetOp, materialized: TargetSet) -> ReconcileError {
        ReconcileError {
            route_id: route_id.to_string(),
            op,
            key: self.key,
            completed: self.completed,
            materialized,
            source: self.source,
        }
    }
}
