//! Error types for the route manager

use cf_route_common::{ApiError, IdError};
use thiserror::Error;

use crate::attributes;
use crate::reconciler::ReconcileError;
use crate::target::DuplicateTarget;

/// Route manager error type
#[derive(Debug, Error)]
pub enum RouteMgrError {
    /// Remote call failed outside target reconciliation
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Target reconciliation stopped part way
    #[error(transparent)]
    Reconcile(Box<ReconcileError>),

    /// Input or remote data broke a documented contract
    #[error("Invalid {field}: {message}")]
    ContractViolation { field: String, message: String },

    /// Attribute cannot change without destroying the route
    #[error("Changing {field} of route '{route_id}' requires replacing the route")]
    RequiresReplacement { route_id: String, field: String },

    /// Create failed and the compensating delete failed too; the route is
    /// left behind on the remote side
    #[error("Route '{route_id}' could not be rolled back after '{cause}': {rollback}")]
    Unrecoverable {
        route_id: String,
        #[source]
        cause: Box<RouteMgrError>,
        rollback: ApiError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for route manager operations
pub type RouteMgrResult<T> = Result<T, RouteMgrError>;

impl RouteMgrError {
    /// Create a contract violation error
    pub fn contract_violation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a requires-replacement error
    pub fn requires_replacement(route_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::RequiresReplacement {
            route_id: route_id.into(),
            field: field.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if the remote reported the addressed entity missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_not_found())
    }

    /// Returns true if a remote route may have been orphaned
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable { .. })
    }

    /// Returns the reconciliation failure, if this is one
    pub fn as_reconcile(&self) -> Option<&ReconcileError> {
        match self {
            Self::Reconcile(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReconcileError> for RouteMgrError {
    fn from(err: ReconcileError) -> Self {
        Self::Reconcile(Box::new(err))
    }
}

impl From<IdError> for RouteMgrError {
    fn from(err: IdError) -> Self {
        Self::contract_violation("id", err.to_string())
    }
}

impl From<DuplicateTarget> for RouteMgrError {
    fn from(err: DuplicateTarget) -> Self {
        Self::contract_violation(attributes::TARGET, err.to_string())
    }
}
