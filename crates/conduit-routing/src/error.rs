//! Routing-specific error types

use conduit_core::PowerLevel;
use thiserror::Error;

use crate::selector::NoAvailableReason;

/// Errors returned by model selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The requested power level is not one of eco, balanced, precision
    #[error("invalid power level: {value:?}")]
    InvalidPowerLevel { value: String },

    /// Nothing in the catalog can serve the tier right now
    #[error("no available provider for power level {power_level}: {reason}")]
    NoAvailableProvider {
        power_level: PowerLevel,
        reason: NoAvailableReason,
    },
}

impl RoutingError {
    /// Whether retrying later could succeed
    ///
    /// Provider availability changes as health recovers; a bad power
    /// level never does.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NoAvailableProvider { .. })
    }
}
