//! Candidate filtering and ranking
//!
//! Candidates are (provider, model) pairs from an enabled, usable
//! provider whose model serves the requested tier and fits the context
//! window. They are ordered by provider priority, then combined price,
//! then ids so the ranking is deterministic without load balancing.

use std::cmp::Ordering;
use std::fmt;

use conduit_core::{Catalog, ModelCatalogEntry, PowerLevel, ProviderCatalogEntry};

use crate::balance::LoadBalancer;
use crate::health::HealthTracker;

/// Why no candidate could be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoAvailableReason {
    /// No enabled provider is currently usable for the tier
    NoHealthyProvider,
    /// Usable providers exist but none offers the tier
    NoModelForPowerLevel,
    /// Models exist at the tier but none has a large enough context window
    ContextWindowTooSmall,
}

impl fmt::Display for NoAvailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoHealthyProvider => "no healthy provider",
            Self::NoModelForPowerLevel => "no model for power level",
            Self::ContextWindowTooSmall => "context window too small",
        })
    }
}

/// Per-request selection constraints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Minimum context window in tokens
    pub min_context_window: Option<u32>,
    /// Shuffle the best priority band by recent load
    pub load_balancing: bool,
}

/// A selectable (provider, model) pair borrowed from the catalog
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub provider: &'a ProviderCatalogEntry,
    pub model: &'a ModelCatalogEntry,
}

impl Candidate<'_> {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.provider
            .priority
            .cmp(&other.provider.priority)
            .then_with(|| {
                self.model
                    .combined_cost_per_k()
                    .total_cmp(&other.model.combined_cost_per_k())
            })
            .then_with(|| self.provider.provider_id.cmp(&other.provider.provider_id))
            .then_with(|| self.model.model_id.cmp(&other.model.model_id))
    }
}

/// Every eligible candidate for `power_level`, best first
///
/// The returned list is never empty.
pub fn rank_candidates<'a>(
    power_level: PowerLevel,
    catalog: &'a Catalog,
    health: &HealthTracker,
    balancer: &LoadBalancer,
    constraints: &Constraints,
) -> Result<Vec<Candidate<'a>>, NoAvailableReason> {
    let mut any_usable = false;
    let mut tier_offered_by_unusable = false;
    let mut fits_on_unusable = false;
    let mut tier_offered = false;
    let mut candidates = Vec::new();

    for provider in catalog.providers().iter().filter(|p| p.enabled) {
        let offers_tier = provider.models.iter().any(|m| m.power_level == power_level);

        if !health.is_usable_with_seed(&provider.provider_id, provider.health_status) {
            tier_offered_by_unusable |= offers_tier;
            fits_on_unusable |= provider
                .models
                .iter()
                .any(|m| m.power_level == power_level && m.fits_context(constraints.min_context_window));
            continue;
        }

        any_usable = true;
        tier_offered |= offers_tier;

        candidates.extend(
            provider
                .models
                .iter()
                .filter(|model| model.power_level == power_level)
                .filter(|model| model.fits_context(constraints.min_context_window))
                .map(|model| Candidate { provider, model }),
        );
    }

    if candidates.is_empty() {
        // A fitting model held back only by health is a health problem
        let reason = if !any_usable || fits_on_unusable || (!tier_offered && tier_offered_by_unusable) {
            NoAvailableReason::NoHealthyProvider
        } else if tier_offered {
            NoAvailableReason::ContextWindowTooSmall
        } else {
            NoAvailableReason::NoModelForPowerLevel
        };

        tracing::debug!(%power_level, %reason, "no routing candidate");
        return Err(reason);
    }

    candidates.sort_by(Candidate::rank_cmp);

    if constraints.load_balancing {
        balance_top_band(&mut candidates, balancer);
    }

    tracing::trace!(%power_level, candidates = candidates.len(), "ranked routing candidates");

    Ok(candidates)
}

/// Best eligible candidate for `power_level`
pub fn select_candidate<'a>(
    power_level: PowerLevel,
    catalog: &'a Catalog,
    health: &HealthTracker,
    balancer: &LoadBalancer,
    constraints: &Constraints,
) -> Result<Candidate<'a>, NoAvailableReason> {
    let ranked = rank_candidates(power_level, catalog, health, balancer, constraints)?;
    ranked
        .into_iter()
        .next()
        .ok_or(NoAvailableReason::NoHealthyProvider)
}

/// Reorder the providers sharing the best priority, keeping each
/// provider's models in price order
fn balance_top_band(candidates: &mut [Candidate<'_>], balancer: &LoadBalancer) {
    let Some(best) = candidates.first().map(|c| c.provider.priority) else {
        return;
    };
    let band_len = candidates
        .iter()
        .take_while(|c| c.provider.priority == best)
        .count();
    let band = &mut candidates[..band_len];

    let mut providers: Vec<&str> = Vec::new();
    for candidate in band.iter() {
        let id = candidate.provider.provider_id.as_str();
        if !providers.contains(&id) {
            providers.push(id);
        }
    }

    if providers.len() < 2 {
        return;
    }

    let order = balancer.order(&providers);
    band.sort_by_key(|c| {
        order
            .iter()
            .position(|id| *id == c.provider.provider_id)
            .unwrap_or(usize::MAX)
    });
}
