//! Desired route descriptions and their validation

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes;
use crate::error::{RouteMgrError, RouteMgrResult};
use crate::target::{Target, TargetSet};
use crate::types::{RouteAddress, RouteSpec};

/// Route description as written by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRoute {
    pub domain_id: String,
    pub space_id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub random_port: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "target")]
    pub targets: Vec<DesiredTarget>,
}

/// One `target` block of a desired route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredTarget {
    pub app_id: String,
    #[serde(default)]
    pub port: Option<u16>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn conflict(field: &str, other: &str) -> RouteMgrError {
    RouteMgrError::contract_violation(field, format!("conflicts with {}", other))
}

impl DesiredRoute {
    /// Parses a TOML route description
    pub fn from_toml_str(content: &str) -> RouteMgrResult<Self> {
        toml::from_str(content)
            .map_err(|e| RouteMgrError::config(format!("Failed to parse route description: {}", e)))
    }

    /// Reads a TOML route description from disk
    pub fn load(path: &Path) -> RouteMgrResult<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!("Loaded route description from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Validates the description and turns it into a [`RouteSpec`].
    ///
    /// Empty strings and a zero port count as unset. Targets without a port
    /// get `default_app_port`.
    pub fn into_spec(self, default_app_port: u16) -> RouteMgrResult<RouteSpec> {
        if self.domain_id.is_empty() {
            return Err(RouteMgrError::contract_violation(attributes::DOMAIN_ID, "is required"));
        }
        if self.space_id.is_empty() {
            return Err(RouteMgrError::contract_violation(attributes::SPACE_ID, "is required"));
        }

        let hostname = non_empty(self.hostname);
        let path = non_empty(self.path);
        let port = self.port.filter(|p| *p > 0);

        let address = match (hostname, port, self.random_port) {
            (_, Some(_), true) => return Err(conflict(attributes::PORT, attributes::RANDOM_PORT)),
            (Some(_), Some(_), _) => return Err(conflict(attributes::HOSTNAME, attributes::PORT)),
            (Some(_), None, true) => {
                return Err(conflict(attributes::HOSTNAME, attributes::RANDOM_PORT))
            }
            (None, Some(port), false) => {
                if path.is_some() {
                    return Err(conflict(attributes::PORT, attributes::PATH));
                }
                RouteAddress::Port(port)
            }
            (None, None, true) => {
                if path.is_some() {
                    return Err(conflict(attributes::RANDOM_PORT, attributes::PATH));
                }
                RouteAddress::RandomPort
            }
            (Some(hostname), None, false) => RouteAddress::Host { hostname, path },
            (None, None, false) => {
                return Err(RouteMgrError::contract_violation(
                    attributes::HOSTNAME,
                    "one of hostname, port or random_port is required",
                ))
            }
        };

        let mut targets = TargetSet::new();
        for target in self.targets {
            if target.app_id.is_empty() {
                return Err(RouteMgrError::contract_violation(
                    attributes::APP_ID,
                    "is required for every target",
                ));
            }
            let port = target.port.unwrap_or(default_app_port);
            targets.insert(Target::with_port(target.app_id, port))?;
        }

        Ok(RouteSpec {
            domain_id: self.domain_id,
            space_id: self.space_id,
            address,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::DEFAULT_APP_PORT;
    use pretty_assertions::assert_eq;

    fn base() -> DesiredRoute {
        DesiredRoute {
            domain_id: "dom-http".to_string(),
            space_id: "space-1".to_string(),
            hostname: Some("api".to_string()),
            ..Default::default()
        }
    }

    fn violation_field(err: RouteMgrError) -> String {
        match err {
            RouteMgrError::ContractViolation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_toml() {
        let desired = DesiredRoute::from_toml_str(
            r#"
domain_id = "dom-http"
space_id = "space-1"
hostname = "api"
path = "v1"

[[target]]
app_id = "app1"

[[target]]
app_id = "app2"
port = 9090
"#,
        )
        .unwrap();

        let spec = desired.into_spec(DEFAULT_APP_PORT).unwrap();
        assert_eq!(
            spec.address,
            RouteAddress::Host {
                hostname: "api".to_string(),
                path: Some("v1".to_string()),
            }
        );
        assert_eq!(
            spec.targets,
            TargetSet::try_from_targets(vec![Target::new("app1"), Target::with_port("app2", 9090)])
                .unwrap()
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = DesiredRoute::from_toml_str("domain_id = ").unwrap_err();
        assert!(matches!(err, RouteMgrError::Configuration(_)));
    }

    #[test]
    fn test_configured_default_port() {
        let desired = DesiredRoute {
            targets: vec![DesiredTarget {
                app_id: "app1".to_string(),
                port: None,
            }],
            ..base()
        };
        let spec = desired.into_spec(3000).unwrap();
        assert!(spec.targets.contains_key(&Target::with_port("app1", 3000).key()));
    }

    #[test]
    fn test_port_route() {
        let desired = DesiredRoute {
            hostname: None,
            port: Some(1024),
            ..base()
        };
        assert_eq!(desired.into_spec(DEFAULT_APP_PORT).unwrap().address, RouteAddress::Port(1024));
    }

    #[test]
    fn test_random_port_route() {
        let desired = DesiredRoute {
            hostname: Some(String::new()),
            random_port: true,
            ..base()
        };
        assert_eq!(
            desired.into_spec(DEFAULT_APP_PORT).unwrap().address,
            RouteAddress::RandomPort
        );
    }

    #[test]
    fn test_conflicting_fields_rejected() {
        let cases = [
            (DesiredRoute { hostname: None, port: Some(1024), path: Some("v1".into()), ..base() }, "port"),
            (DesiredRoute { hostname: None, port: Some(1024), random_port: true, ..base() }, "port"),
            (DesiredRoute { hostname: None, random_port: true, path: Some("v1".into()), ..base() }, "random_port"),
            (DesiredRoute { port: Some(1024), ..base() }, "hostname"),
            (DesiredRoute { random_port: true, ..base() }, "hostname"),
        ];
        for (desired, field) in cases {
            let err = desired.into_spec(DEFAULT_APP_PORT).unwrap_err();
            assert_eq!(violation_field(err), field);
        }
    }

    #[test]
    fn test_missing_address_rejected() {
        let desired = DesiredRoute {
            hostname: None,
            path: Some("v1".to_string()),
            ..base()
        };
        let err = desired.into_spec(DEFAULT_APP_PORT).unwrap_err();
        assert_eq!(violation_field(err), "hostname");
    }

    #[test]
    fn test_required_ids() {
        let err = DesiredRoute { domain_id: String::new(), ..base() }
            .into_spec(DEFAULT_APP_PORT)
            .unwrap_err();
        assert_eq!(violation_field(err), "domain_id");

        let err = DesiredRoute { space_id: String::new(), ..base() }
            .into_spec(DEFAULT_APP_PORT)
            .unwrap_err();
        assert_eq!(violation_field(err), "space_id");
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let desired = DesiredRoute {
            targets: vec![
                DesiredTarget { app_id: "app1".to_string(), port: None },
                DesiredTarget { app_id: "app1".to_string(), port: Some(8080) },
            ],
            ..base()
        };
        let err = desired.into_spec(DEFAULT_APP_PORT).unwrap_err();
        assert_eq!(violation_field(err), "target");
    }

    #[test]
    fn test_target_without_app_rejected() {
        let desired = DesiredRoute {
            targets: vec![DesiredTarget::default()],
            ..base()
        };
        let err = desired.into_spec(DEFAULT_APP_PORT).unwrap_err();
        assert_eq!(violation_field(err), "app_id");
    }
}
