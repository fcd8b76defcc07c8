//! Error types for Cloud Controller calls.
//!
//! Every remote operation returns [`ApiError`] on failure. The managers
//! propagate it verbatim; the only classification they rely on is
//! [`ApiError::is_not_found`].

use std::fmt;
use thiserror::Error;

/// Result type alias for Cloud Controller calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Kind of remote entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Route,
    RouteMapping,
    Domain,
    PrivateDomainAccess,
}

impl EntityKind {
    /// Returns the entity name as used in log and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Route => "route",
            EntityKind::RouteMapping => "route mapping",
            EntityKind::Domain => "domain",
            EntityKind::PrivateDomainAccess => "private domain access",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the Cloud Controller client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Transport or authentication failure.
    #[error("Cloud Controller unavailable during {operation}: {message}")]
    RemoteUnavailable {
        /// The operation that was attempted (e.g., "create_route").
        operation: String,
        /// Error message from the client.
        message: String,
    },

    /// The remote entity does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up.
        kind: EntityKind,
        /// The identifier that was looked up.
        id: String,
    },

    /// The Cloud Controller refused the request.
    #[error("Cloud Controller rejected {operation}: {message}")]
    Rejected {
        /// The operation that was attempted.
        operation: String,
        /// Error description returned by the API.
        message: String,
    },
}

impl ApiError {
    /// Creates a remote-unavailable error.
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a rejected-request error.
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the remote entity was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns true if the failure came from the transport rather than the API.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::RemoteUnavailable { .. })
    }
}
