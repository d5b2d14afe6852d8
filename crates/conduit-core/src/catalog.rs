//! Provider and model catalog snapshot
//!
//! The catalog is owned by an external registry and handed to the router
//! per call. It is validated once when the snapshot is built so routing
//! never has to re-check individual fields.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::CatalogError;
use crate::power::PowerLevel;

/// Provider liveness as reported by the catalog owner or the health tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    /// Serving normally
    #[default]
    Healthy,
    /// Recent failures, still eligible for routing
    Degraded,
    /// Excluded from routing until a success is reported
    Unhealthy,
}

/// A model offered by exactly one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelCatalogEntry {
    /// Provider-side model identifier
    pub model_id: String,
    /// Human-readable name
    #[serde(default)]
    pub display_name: String,
    /// Tier this model serves
    pub power_level: PowerLevel,
    /// Price per 1000 prompt tokens
    #[serde(default)]
    pub cost_per_k_tokens_in: f64,
    /// Price per 1000 completion tokens
    #[serde(default)]
    pub cost_per_k_tokens_out: f64,
    /// Context window in tokens
    #[serde(default)]
    pub context_window: u32,
}

impl ModelCatalogEntry {
    /// Input plus output price, used to order models within a priority band
    pub fn combined_cost_per_k(&self) -> f64 {
        self.cost_per_k_tokens_in + self.cost_per_k_tokens_out
    }

    /// Whether the model satisfies an optional minimum context window
    pub fn fits_context(&self, min_context_window: Option<u32>) -> bool {
        min_context_window.is_none_or(|min| self.context_window >= min)
    }
}

/// A provider and the models it serves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderCatalogEntry {
    /// Stable provider identifier
    pub provider_id: String,
    /// Human-readable name
    #[serde(default)]
    pub provider_name: String,
    /// Protocol family (e.g. "openai", "anthropic")
    #[serde(default)]
    pub provider_type: String,
    /// Disabled providers are never routed to
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower value is preferred
    #[serde(default)]
    pub priority: u32,
    /// Status supplied by the catalog owner
    #[serde(default)]
    pub health_status: HealthStatus,
    /// Models served by this provider, possibly empty
    #[serde(default)]
    pub models: Vec<ModelCatalogEntry>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

/// Validated, immutable catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct Catalog {
    providers: Vec<ProviderCatalogEntry>,
}

/// On-disk shape of a catalog
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    providers: Vec<ProviderCatalogEntry>,
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        Self::new(document.providers)
    }
}

impl Catalog {
    /// Validate and wrap a list of providers
    pub fn new(providers: Vec<ProviderCatalogEntry>) -> Result<Self, CatalogError> {
        let mut provider_ids = HashSet::with_capacity(providers.len());

        for provider in &providers {
            if provider.provider_id.trim().is_empty() {
                return Err(CatalogError::EmptyId {
                    context: "provider".to_owned(),
                });
            }

            if !provider_ids.insert(provider.provider_id.as_str()) {
                return Err(CatalogError::DuplicateProvider {
                    provider_id: provider.provider_id.clone(),
                });
            }

            validate_models(provider)?;
        }

        Ok(Self { providers })
    }

    /// Parse a TOML catalog document (`[[providers]]` / `[[providers.models]]`)
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        toml::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// All providers in catalog order
    pub fn providers(&self) -> &[ProviderCatalogEntry] {
        &self.providers
    }

    /// Look up a provider by id
    pub fn provider(&self, provider_id: &str) -> Option<&ProviderCatalogEntry> {
        self.providers.iter().find(|p| p.provider_id == provider_id)
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the catalog has no providers
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn validate_models(provider: &ProviderCatalogEntry) -> Result<(), CatalogError> {
    let mut model_ids = HashSet::with_capacity(provider.models.len());

    for model in &provider.models {
        if model.model_id.trim().is_empty() {
            return Err(CatalogError::EmptyId {
                context: format!("model of provider '{}'", provider.provider_id),
            });
        }

        if !model_ids.insert(model.model_id.as_str()) {
            return Err(CatalogError::DuplicateModel {
                provider_id: provider.provider_id.clone(),
                model_id: model.model_id.clone(),
            });
        }

        for value in [model.cost_per_k_tokens_in, model.cost_per_k_tokens_out] {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::InvalidPrice {
                    provider_id: provider.provider_id.clone(),
                    model_id: model.model_id.clone(),
                    value,
                });
            }
        }
    }

    Ok(())
}
