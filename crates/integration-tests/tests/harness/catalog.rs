//! Programmatic catalog builder

use conduit_core::{Catalog, HealthStatus, ModelCatalogEntry, PowerLevel, ProviderCatalogEntry};

/// Builder for test catalogs
#[derive(Default)]
pub struct CatalogBuilder {
    providers: Vec<ProviderCatalogEntry>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a healthy, enabled provider with no models
    pub fn provider(mut self, id: &str, priority: u32) -> Self {
        self.providers.push(ProviderCatalogEntry {
            provider_id: id.to_owned(),
            provider_name: id.to_owned(),
            provider_type: "openai".to_owned(),
            enabled: true,
            priority,
            health_status: HealthStatus::Healthy,
            models: Vec::new(),
        });
        self
    }

    /// Add a model to the most recently added provider
    pub fn model(mut self, id: &str, power_level: PowerLevel, cost_per_k: f64, context_window: u32) -> Self {
        let provider = self.providers.last_mut().expect("add a provider first");
        provider.models.push(ModelCatalogEntry {
            model_id: id.to_owned(),
            display_name: id.to_owned(),
            power_level,
            cost_per_k_tokens_in: cost_per_k,
            cost_per_k_tokens_out: cost_per_k,
            context_window,
        });
        self
    }

    /// Set the catalog-reported health of the most recent provider
    pub fn health(mut self, status: HealthStatus) -> Self {
        self.providers.last_mut().expect("add a provider first").health_status = status;
        self
    }

    /// Disable the most recent provider
    pub fn disabled(mut self) -> Self {
        self.providers.last_mut().expect("add a provider first").enabled = false;
        self
    }

    pub fn build(self) -> Catalog {
        Catalog::new(self.providers).expect("valid test catalog")
    }
}

/// Provider A (priority 1, free) and B (priority 2, cheap) serving every tier
pub fn priority_pair() -> Catalog {
    let mut builder = CatalogBuilder::new();
    for (id, priority, cost) in [("a", 1, 0.0), ("b", 2, 0.0001)] {
        builder = builder.provider(id, priority);
        for level in PowerLevel::ALL {
            builder = builder.model(&format!("{id}-{level}"), level, cost, 32_000);
        }
    }
    builder.build()
}

/// Two equal-priority, equal-cost providers at the balanced tier
pub fn balanced_pair() -> Catalog {
    CatalogBuilder::new()
        .provider("left", 1)
        .model("left-balanced", PowerLevel::Balanced, 0.001, 32_000)
        .provider("right", 1)
        .model("right-balanced", PowerLevel::Balanced, 0.001, 32_000)
        .build()
}
