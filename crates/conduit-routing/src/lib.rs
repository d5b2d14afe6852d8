//! Model routing for Conduit
//!
//! Turns a requested power level into a concrete provider and model:
//! - **Health**: per-provider state machine fed by call outcomes
//! - **Selector**: filters and ranks catalog candidates
//! - **Balancer**: spreads traffic across the best priority band
//! - **Engine**: adds BYOK preference and usage reporting on top

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod balance;
pub mod engine;
pub mod error;
pub mod health;
pub mod selector;

pub use balance::{InverseLoad, LoadBalancer, Weighting};
pub use engine::{EngineSettings, RoutingEngine, SelectOptions};
pub use error::RoutingError;
pub use health::{HealthRecord, HealthTracker};
pub use selector::{Candidate, Constraints, NoAvailableReason, rank_candidates, select_candidate};
