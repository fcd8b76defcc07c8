//! Resource attribute names
//!
//! Used as the `field` of validation and replacement errors.

pub const DOMAIN_ID: &str = "domain_id";
pub const SPACE_ID: &str = "space_id";
pub const HOSTNAME: &str = "hostname";
pub const PORT: &str = "port";
pub const RANDOM_PORT: &str = "random_port";
pub const PATH: &str = "path";

/// Target block and its fields
pub const TARGET: &str = "target";
pub const APP_ID: &str = "app_id";
