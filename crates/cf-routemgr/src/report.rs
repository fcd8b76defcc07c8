//! Dry-run route plans and their text rendering

use std::fmt;

use crate::reconciler::TargetPlan;
use crate::target::{Target, TargetSet};
use crate::types::{RouteSpec, RouteState};

/// What applying a desired route does to the route itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Create,
    /// Destroy and recreate because a creation-time attribute changed
    Replace { field: &'static str },
    /// Route kept; `route_changed` is set when domain, space or hostname change
    Update { route_changed: bool },
    Unchanged,
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteAction::Create => f.write_str("create route"),
            RouteAction::Replace { field } => write!(f, "replace route ({} changed)", field),
            RouteAction::Update { route_changed: true } => f.write_str("update route in place"),
            RouteAction::Update { route_changed: false } => f.write_str("update route targets"),
            RouteAction::Unchanged => f.write_str("no changes"),
        }
    }
}

/// Route action plus the target changes it implies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub action: RouteAction,
    pub targets: TargetPlan,
}

impl RoutePlan {
    /// Plans moving from `prior` (if the route exists) to `desired`
    pub fn compute(prior: Option<&RouteState>, desired: &RouteSpec) -> Self {
        let Some(prior) = prior else {
            return Self {
                action: RouteAction::Create,
                targets: TargetPlan::compute(&TargetSet::new(), &desired.targets),
            };
        };

        if let Some(field) = desired.replacement_field(prior) {
            return Self {
                action: RouteAction::Replace { field },
                targets: TargetPlan {
                    unchanged: TargetSet::new(),
                    to_remove: prior.targets.clone(),
                    to_add: desired.targets.clone(),
                },
            };
        }

        let targets = TargetPlan::compute(&prior.targets, &desired.targets);
        let route_changed = desired.differs_in_place(prior);
        let action = if route_changed || !desired.targets.same_keys(&prior.targets) {
            RouteAction::Update { route_changed }
        } else {
            RouteAction::Unchanged
        };
        Self { action, targets }
    }
}

fn describe(target: &Target) -> String {
    match target.mapping_id() {
        Some(mapping_id) => format!(
            "app {} port {} (mapping {})",
            target.app_id, target.port, mapping_id
        ),
        None => format!("app {} port {}", target.app_id, target.port),
    }
}

/// Build the plan header line
pub fn build_header_line(route: &str, plan: &RoutePlan) -> String {
    format!("route {}: {}", route, plan.action)
}

/// Build one line per target change
///
/// Removals come first, matching the order in which they are applied.
pub fn build_target_lines(plan: &TargetPlan) -> Vec<String> {
    let mut lines = Vec::new();
    for target in plan.to_remove.iter() {
        if target.mapping_id().is_some() {
            lines.push(format!("  - unmap {}", describe(target)));
        } else {
            lines.push(format!("  ~ skip {} (no mapping id)", describe(target)));
        }
    }
    for target in plan.to_add.iter() {
        lines.push(format!("  + map {}", describe(target)));
    }
    for target in plan.unchanged.iter() {
        lines.push(format!("    keep {}", describe(target)));
    }
    lines
}

/// Build the full plan report
pub fn build_plan_report(route: &str, plan: &RoutePlan) -> Vec<String> {
    let mut lines = vec![build_header_line(route, plan)];
    lines.extend(build_target_lines(&plan.targets));
    lines
}
