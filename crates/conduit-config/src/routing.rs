use std::time::Duration;

use serde::Deserialize;

/// Candidate ranking and load-balancing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Spread traffic across providers sharing the best priority
    #[serde(default)]
    pub load_balancing: bool,
    /// How long a provider's request counter stays "recent" (e.g. "60s")
    #[serde(default = "default_window")]
    pub load_balancing_window: String,
    /// Prefer the caller's own credential when one is stored
    #[serde(default = "default_prefer_byok")]
    pub prefer_byok: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            load_balancing: false,
            load_balancing_window: default_window(),
            prefer_byok: default_prefer_byok(),
        }
    }
}

impl RoutingConfig {
    /// Parsed load-balancing window
    ///
    /// # Errors
    ///
    /// Returns an error if the window is not a valid duration
    pub fn load_balancing_window(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("routing.load_balancing_window", &self.load_balancing_window)
    }
}

fn default_window() -> String {
    "60s".to_owned()
}

const fn default_prefer_byok() -> bool {
    true
}
