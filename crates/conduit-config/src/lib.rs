#![allow(clippy::must_use_candidate)]

mod env;
pub mod health;
mod loader;
pub mod routing;
pub mod telemetry;
pub mod usage;
pub mod vault;

use std::time::Duration;

use serde::Deserialize;

pub use env::{ExpandError, expand_env};
pub use health::*;
pub use routing::*;
pub use telemetry::TelemetryConfig;
pub use usage::*;
pub use vault::*;

/// Top-level Conduit configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Candidate ranking and load balancing
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Provider health thresholds
    #[serde(default)]
    pub health: HealthConfig,
    /// BYOK credential vault
    #[serde(default)]
    pub vault: VaultConfig,
    /// Usage log persistence
    #[serde(default)]
    pub usage: UsageConfig,
    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Parse a human duration such as `"5m"` or `"50ms"`
///
/// # Errors
///
/// Returns an error if the string is not a valid duration
pub fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}
