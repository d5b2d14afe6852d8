//! Shared value types for Conduit
//!
//! Catalog snapshots, power levels, routing decisions and the cost
//! calculator. Every other crate in the workspace builds on these.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod catalog;
pub mod cost;
pub mod decision;
pub mod error;
pub mod power;

pub use catalog::{Catalog, HealthStatus, ModelCatalogEntry, ProviderCatalogEntry};
pub use cost::cost;
pub use decision::RoutingDecision;
pub use error::CatalogError;
pub use power::PowerLevel;
