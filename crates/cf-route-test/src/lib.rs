//! Test infrastructure for the Cloud Foundry route managers
//!
//! Provides:
//! - An in-memory Cloud Controller implementing `RouteApi` and `DomainApi`
//! - Call recording and failure injection
//! - Seeded fixtures for common domains, routes and mappings
//! - Call-log verification helpers

pub mod controller;
pub mod fixtures;
mod verification;

pub use controller::{ApiCall, FakeCloudController};
pub use fixtures::*;
pub use verification::*;
