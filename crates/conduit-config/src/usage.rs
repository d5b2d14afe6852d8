use std::path::PathBuf;

use serde::Deserialize;

/// Usage log persistence
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    /// Append-only JSON lines file; usage stays in memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}
