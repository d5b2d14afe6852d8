use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Caller-selected quality/cost tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PowerLevel {
    /// Cheapest adequate model
    Eco,
    /// Middle ground between cost and quality
    Balanced,
    /// Highest quality regardless of cost
    Precision,
}

impl PowerLevel {
    /// All known tiers, cheapest first
    pub const ALL: [Self; 3] = [Self::Eco, Self::Balanced, Self::Precision];

    /// Parse a tier name, ignoring case and surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}
