//! Cloud Controller API contract for the Cloud Foundry route managers.
//!
//! This crate holds everything the managers need from the remote platform
//! without implementing any transport:
//!
//! - [`client`]: the [`RouteApi`] and [`DomainApi`] traits the managers call
//! - [`types`]: remote entities (routes, route mappings, domains)
//! - [`error`]: [`ApiError`], the structured failure every remote call returns
//! - [`id`]: composite `<a>/<b>` identifiers used by passthrough imports
//!
//! # Architecture
//!
//! Managers never reach the remote system through ambient state. A client is
//! handed to them explicitly as `Arc<dyn RouteApi>` / `Arc<dyn DomainApi>`:
//!
//! 1. The orchestration layer builds a client (HTTP, in-memory fake, ...)
//! 2. Managers receive it at construction
//! 3. Every remote call is awaited before the next one is issued
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cf_route_common::{ApiResult, RouteApi};
//!
//! async fn unmap(client: Arc<dyn RouteApi>, mapping_id: &str) -> ApiResult<()> {
//!     match client.delete_route_mapping(mapping_id).await {
//!         Err(e) if e.is_not_found() => Ok(()),
//!         other => other,
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod id;
pub mod types;

// Re-export commonly used items at crate root
pub use client::{DomainApi, RouteApi};
pub use error::{ApiError, ApiResult, EntityKind};
pub use id::{compute_id, parse_id, IdError};
pub use types::{Domain, RouteEntity, RouteMapping, RouteRequest, RouteUpdate};
