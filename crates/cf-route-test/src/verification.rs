//! Verification helpers for testing route managers
//!
//! Provides assertion helpers over the call log of a [`FakeCloudController`]

use thiserror::Error;

use crate::{ApiCall, FakeCloudController};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected call {expected} not found in {actual}")]
    CallNotFound { expected: String, actual: String },

    #[error("Unexpected call {call} found")]
    UnexpectedCall { call: String },

    #[error("Expected {expected} {what} calls, found {actual}")]
    CallCountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Call {later} at position {later_pos} happened before {earlier} at position {earlier_pos}")]
    OrderViolation {
        earlier: String,
        earlier_pos: usize,
        later: String,
        later_pos: usize,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Call-log verifier
pub struct CallVerifier {
    calls: Vec<ApiCall>,
}

impl CallVerifier {
    /// Create a verifier over an explicit call list
    pub fn new(calls: Vec<ApiCall>) -> Self {
        Self { calls }
    }

    /// Snapshot the calls recorded by a controller
    pub fn of(controller: &FakeCloudController) -> Self {
        Self::new(controller.calls())
    }

    /// Verify that a call was made
    pub fn assert_called(&self, expected: &ApiCall) -> VerifyResult<()> {
        if self.calls.contains(expected) {
            Ok(())
        } else {
            Err(VerificationError::CallNotFound {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", self.calls),
            })
        }
    }

    /// Verify that a call was NOT made
    pub fn assert_not_called(&self, unexpected: &ApiCall) -> VerifyResult<()> {
        if self.calls.contains(unexpected) {
            Err(VerificationError::UnexpectedCall {
                call: format!("{:?}", unexpected),
            })
        } else {
            Ok(())
        }
    }

    /// Verify the number of mapping creations
    pub fn assert_mapping_creates(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("create mapping", expected, |c| {
            matches!(c, ApiCall::CreateMapping { .. })
        })
    }

    /// Verify the number of mapping deletions
    pub fn assert_mapping_deletes(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("delete mapping", expected, |c| {
            matches!(c, ApiCall::DeleteMapping(_))
        })
    }

    /// Verify the number of state-changing calls
    pub fn assert_mutation_count(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("mutating", expected, ApiCall::is_mutation)
    }

    /// Verify that every mapping deletion precedes every mapping creation
    pub fn assert_deletes_before_creates(&self) -> VerifyResult<()> {
        let last_delete = self
            .calls
            .iter()
            .rposition(|c| matches!(c, ApiCall::DeleteMapping(_)));
        let first_create = self
            .calls
            .iter()
            .position(|c| matches!(c, ApiCall::CreateMapping { .. }));

        match (last_delete, first_create) {
            (Some(d), Some(c)) if c < d => Err(VerificationError::OrderViolation {
                earlier: format!("{:?}", self.calls[d]),
                earlier_pos: d,
                later: format!("{:?}", self.calls[c]),
                later_pos: c,
            }),
            _ => Ok(()),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> &[ApiCall] {
        &self.calls
    }

    fn assert_count<F>(&self, what: &str, expected: usize, pred: F) -> VerifyResult<()>
    where
        F: Fn(&ApiCall) -> bool,
    {
        let actual = self.calls.iter().filter(|c| pred(*c)).count();
        if actual != expected {
            Err(VerificationError::CallCountMismatch {
                what: what.to_string(),
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }
}
