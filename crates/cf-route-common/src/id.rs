//! Composite identifiers for resources without a remote GUID of their own.
//!
//! A private domain access is identified by `<org_guid>/<domain_guid>`.

use thiserror::Error;

/// Separator between the two halves of a composite id.
pub const ID_SEPARATOR: char = '/';

/// Malformed composite id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid id '{id}': expected '<guid>/<guid>'")]
pub struct IdError {
    /// The id that failed to parse.
    pub id: String,
}

/// Joins two identifiers into a composite id.
pub fn compute_id(first: &str, second: &str) -> String {
    format!("{}{}{}", first, ID_SEPARATOR, second)
}

/// Splits a composite id into its two halves.
///
/// Both halves must be non-empty and the id must contain exactly one
/// separator.
pub fn parse_id(id: &str) -> Result<(String, String), IdError> {
    let invalid = || IdError { id: id.to_string() };

    let (first, second) = id.split_once(ID_SEPARATOR).ok_or_else(invalid)?;
    if first.is_empty() || second.is_empty() || second.contains(ID_SEPARATOR) {
        return Err(invalid());
    }
    Ok((first.to_string(), second.to_string()))
}
