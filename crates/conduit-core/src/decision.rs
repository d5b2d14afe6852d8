use serde::{Deserialize, Serialize};

use crate::catalog::{ModelCatalogEntry, ProviderCatalogEntry};
use crate::power::PowerLevel;

/// Result of a routing decision
///
/// Carries no credential material; `used_byok` only says whether the
/// caller's own key was selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected provider id
    pub provider_id: String,
    /// Selected provider display name
    pub provider_name: String,
    /// Selected provider protocol family
    pub provider_type: String,
    /// Selected model id
    pub model_id: String,
    /// Tier the decision was made for
    pub power_level: PowerLevel,
    /// Price per 1000 prompt tokens
    pub cost_per_k_tokens_in: f64,
    /// Price per 1000 completion tokens
    pub cost_per_k_tokens_out: f64,
    /// Whether the caller's own credential will be used
    pub used_byok: bool,
}

impl RoutingDecision {
    /// Build a decision from the selected catalog pair
    pub fn new(provider: &ProviderCatalogEntry, model: &ModelCatalogEntry, used_byok: bool) -> Self {
        Self {
            provider_id: provider.provider_id.clone(),
            provider_name: provider.provider_name.clone(),
            provider_type: provider.provider_type.clone(),
            model_id: model.model_id.clone(),
            power_level: model.power_level,
            cost_per_k_tokens_in: model.cost_per_k_tokens_in,
            cost_per_k_tokens_out: model.cost_per_k_tokens_out,
            used_byok,
        }
    }

    /// Canonical identifier in "provider/model" format
    pub fn id(&self) -> String {
        format!("{}/{}", self.provider_id, self.model_id)
    }

    /// Cost of a completed request at this decision's prices
    pub fn cost_for(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        crate::cost::cost(
            prompt_tokens,
            completion_tokens,
            self.cost_per_k_tokens_in,
            self.cost_per_k_tokens_out,
        )
    }
}
