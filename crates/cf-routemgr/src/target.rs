//! Route targets and target sets

use std::fmt;

use cf_route_common::RouteMapping;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application port used when a target does not name one
pub const DEFAULT_APP_PORT: u16 = 8080;

/// Matching key of a target: (application id, application port)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetKey {
    pub app_id: String,
    pub port: u16,
}

impl TargetKey {
    pub fn new(app_id: impl Into<String>, port: u16) -> Self {
        Self {
            app_id: app_id.into(),
            port,
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.app_id, self.port)
    }
}

/// A binding of a route to an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Application GUID
    pub app_id: String,
    /// Application port
    #[serde(default = "default_app_port")]
    pub port: u16,
    /// Route mapping GUID, known once the binding exists remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_id: Option<String>,
}

fn default_app_port() -> u16 {
    DEFAULT_APP_PORT
}

impl Target {
    /// Creates an unmapped target on the default application port
    pub fn new(app_id: impl Into<String>) -> Self {
        Self::with_port(app_id, DEFAULT_APP_PORT)
    }

    /// Creates an unmapped target on `port`
    pub fn with_port(app_id: impl Into<String>, port: u16) -> Self {
        Self {
            app_id: app_id.into(),
            port,
            mapping_id: None,
        }
    }

    /// Returns this target with its mapping id set
    pub fn mapped(mut self, mapping_id: impl Into<String>) -> Self {
        self.mapping_id = Some(mapping_id.into());
        self
    }

    /// Builds a target from an observed remote mapping
    pub fn from_mapping(mapping: &RouteMapping, default_port: u16) -> Self {
        Self {
            app_id: mapping.app_id.clone(),
            port: mapping.app_port.unwrap_or(default_port),
            mapping_id: Some(mapping.mapping_id.clone()),
        }
    }

    pub fn key(&self) -> TargetKey {
        TargetKey::new(self.app_id.clone(), self.port)
    }

    /// Returns the mapping id, treating an empty id as absent
    pub fn mapping_id(&self) -> Option<&str> {
        self.mapping_id.as_deref().filter(|id| !id.is_empty())
    }

    fn matches(&self, key: &TargetKey) -> bool {
        self.app_id == key.app_id && self.port == key.port
    }
}

/// Two targets in one set share a key
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Duplicate target {key}")]
pub struct DuplicateTarget {
    pub key: TargetKey,
}

/// Targets of one route, unique by [`TargetKey`]
///
/// Iteration follows insertion order. Equality ignores order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Target>", into = "Vec<Target>")]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, rejecting duplicate keys
    pub fn try_from_targets<I>(targets: I) -> Result<Self, DuplicateTarget>
    where
        I: IntoIterator<Item = Target>,
    {
        let mut set = Self::new();
        for target in targets {
            set.insert(target)?;
        }
        Ok(set)
    }

    /// Adds a target, rejecting a duplicate key
    pub fn insert(&mut self, target: Target) -> Result<(), DuplicateTarget> {
        if self.contains_key(&target.key()) {
            return Err(DuplicateTarget { key: target.key() });
        }
        self.targets.push(target);
        Ok(())
    }

    pub fn contains_key(&self, key: &TargetKey) -> bool {
        self.targets.iter().any(|t| t.matches(key))
    }

    pub fn get(&self, key: &TargetKey) -> Option<&Target> {
        self.targets.iter().find(|t| t.matches(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = TargetKey> + '_ {
        self.targets.iter().map(Target::key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns true if both sets hold the same keys, ignoring mapping ids
    pub fn same_keys(&self, other: &TargetSet) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.contains_key(&k))
    }

    /// Targets of `self` whose key is absent from `other`, in `self` order
    pub fn difference<'a>(&'a self, other: &'a TargetSet) -> impl Iterator<Item = &'a Target> + 'a {
        self.targets.iter().filter(move |t| !other.contains_key(&t.key()))
    }

    /// Targets of `self` whose key is also in `other`, in `self` order
    pub fn intersection<'a>(&'a self, other: &'a TargetSet) -> impl Iterator<Item = &'a Target> + 'a {
        self.targets.iter().filter(move |t| other.contains_key(&t.key()))
    }

    /// Appends a target whose key is known to be absent
    pub(crate) fn push_unchecked(&mut self, target: Target) {
        debug_assert!(!self.contains_key(&target.key()));
        self.targets.push(target);
    }
}

impl PartialEq for TargetSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .targets
                .iter()
                .all(|t| other.get(&t.key()).is_some_and(|o| o == t))
    }
}

impl Eq for TargetSet {}

impl TryFrom<Vec<Target>> for TargetSet {
    type Error = DuplicateTarget;

    fn try_from(targets: Vec<Target>) -> Result<Self, Self::Error> {
        Self::try_from_targets(targets)
    }
}

impl From<TargetSet> for Vec<Target> {
    fn from(set: TargetSet) -> Self {
        set.targets
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
