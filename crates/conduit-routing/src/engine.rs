//! Routing engine
//!
//! Composes the selector, health tracker, load balancer and credential
//! vault into `select_model`, and feeds call outcomes back through
//! `report_outcome`.

use std::collections::HashSet;
use std::time::Duration;

use conduit_config::{Config, HealthConfig, RoutingConfig};
use conduit_core::{Catalog, PowerLevel, RoutingDecision};
use conduit_usage::{BackgroundRecorder, Outcome, UsageError, UsageRecord, UsageRecorder};
use conduit_vault::CredentialVault;

use crate::balance::LoadBalancer;
use crate::error::RoutingError;
use crate::health::HealthTracker;
use crate::selector::{Candidate, Constraints, rank_candidates};

/// Per-call routing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Use the caller's stored credential when one exists
    pub prefer_byok: bool,
    /// Minimum context window in tokens
    pub min_context_window: Option<u32>,
    /// Spread traffic across the best priority band
    pub enable_load_balancing: bool,
}

impl SelectOptions {
    /// Options carrying the configured routing defaults
    pub const fn from_config(config: &RoutingConfig) -> Self {
        Self {
            prefer_byok: config.prefer_byok,
            min_context_window: None,
            enable_load_balancing: config.load_balancing,
        }
    }
}

/// Engine-wide timing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Upper bound on the BYOK credential walk
    pub lookup_timeout: Duration,
    /// Load balancer counter window
    pub balance_window: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(50),
            balance_window: Duration::from_secs(60),
        }
    }
}

impl EngineSettings {
    /// Settings from parsed configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            lookup_timeout: config.vault.lookup_timeout()?,
            balance_window: config.routing.load_balancing_window()?,
        })
    }
}

/// Selects a provider and model per request and tracks outcomes
///
/// Owns its health tracker and load balancer; share it behind an `Arc`.
pub struct RoutingEngine {
    health: HealthTracker,
    balancer: LoadBalancer,
    vault: Option<CredentialVault>,
    recorder: UsageRecorder,
    background: Option<BackgroundRecorder>,
    lookup_timeout: Duration,
}

impl RoutingEngine {
    /// Create an engine; without a vault BYOK is never used
    pub fn new(
        health: &HealthConfig,
        settings: EngineSettings,
        vault: Option<CredentialVault>,
        recorder: UsageRecorder,
    ) -> Self {
        Self {
            health: HealthTracker::new(health),
            balancer: LoadBalancer::new(settings.balance_window),
            vault,
            recorder,
            background: None,
            lookup_timeout: settings.lookup_timeout,
        }
    }

    /// Route [`Self::report_outcome_detached`] through a background recorder
    #[must_use]
    pub fn with_background_recorder(mut self, background: BackgroundRecorder) -> Self {
        self.background = Some(background);
        self
    }

    /// Select a model for a power level given as text
    ///
    /// # Errors
    ///
    /// Returns `InvalidPowerLevel` if `power_level` is not eco,
    /// balanced or precision (case-insensitive), or `NoAvailableProvider`
    /// if nothing in the catalog can serve it right now
    pub async fn select_model(
        &self,
        power_level: &str,
        user_id: &str,
        catalog: &Catalog,
        options: &SelectOptions,
    ) -> Result<RoutingDecision, RoutingError> {
        let Some(level) = PowerLevel::parse(power_level) else {
            return Err(RoutingError::InvalidPowerLevel {
                value: power_level.to_owned(),
            });
        };

        self.select_model_typed(level, user_id, catalog, options).await
    }

    /// Select a model for a power level
    ///
    /// # Errors
    ///
    /// Returns `NoAvailableProvider` if nothing in the catalog can serve
    /// the tier right now
    pub async fn select_model_typed(
        &self,
        power_level: PowerLevel,
        user_id: &str,
        catalog: &Catalog,
        options: &SelectOptions,
    ) -> Result<RoutingDecision, RoutingError> {
        let constraints = Constraints {
            min_context_window: options.min_context_window,
            load_balancing: options.enable_load_balancing,
        };

        let candidates = rank_candidates(power_level, catalog, &self.health, &self.balancer, &constraints)
            .map_err(|reason| RoutingError::NoAvailableProvider { power_level, reason })?;

        // rank_candidates never returns an empty list
        let mut chosen = candidates[0];
        let mut used_byok = false;

        if options.prefer_byok
            && let Some(vault) = &self.vault
        {
            match tokio::time::timeout(self.lookup_timeout, first_with_credential(vault, user_id, &candidates)).await {
                Ok(Some(candidate)) => {
                    chosen = candidate;
                    used_byok = true;
                }
                Ok(None) => {}
                Err(_) => {
                    tracing::warn!(
                        user_id,
                        timeout_ms = u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                        "byok credential lookup timed out, using platform credential"
                    );
                }
            }
        }

        self.balancer.record(&chosen.provider.provider_id);

        let decision = RoutingDecision::new(chosen.provider, chosen.model, used_byok);
        tracing::debug!(
            user_id,
            provider = %decision.provider_id,
            model = %decision.model_id,
            %power_level,
            used_byok,
            "routing decision made"
        );

        Ok(decision)
    }

    /// Feed the outcome of an executed decision back into health and usage
    ///
    /// Health is updated before usage is persisted, so a usage store
    /// failure never loses the health signal.
    ///
    /// # Errors
    ///
    /// Returns the usage store's error if the record could not be
    /// persisted
    pub async fn report_outcome(
        &self,
        user_id: &str,
        decision: &RoutingDecision,
        outcome: &Outcome,
    ) -> Result<UsageRecord, UsageError> {
        self.report_health(decision, outcome);

        self.recorder
            .log_usage(user_id, decision, outcome)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    user_id,
                    provider = %decision.provider_id,
                    error = %e,
                    "failed to record usage"
                );
            })
    }

    /// Best-effort [`Self::report_outcome`] that never waits on the usage store
    ///
    /// Health is updated before returning. The record is queued on the
    /// background recorder when one is configured, otherwise persisted on
    /// a spawned task; persistence failures are only logged. Must be
    /// called inside a tokio runtime.
    pub fn report_outcome_detached(&self, user_id: &str, decision: &RoutingDecision, outcome: &Outcome) -> UsageRecord {
        self.report_health(decision, outcome);
        let record = UsageRecord::new(user_id, decision, outcome);

        if let Some(background) = &self.background {
            background.record(record.clone());
        } else {
            let recorder = self.recorder.clone();
            let queued = record.clone();
            tokio::spawn(async move {
                if let Err(e) = recorder.persist(&queued).await {
                    tracing::warn!(
                        record_id = %queued.id,
                        provider = %queued.provider_id,
                        error = %e,
                        "failed to record usage"
                    );
                }
            });
        }

        record
    }

    fn report_health(&self, decision: &RoutingDecision, outcome: &Outcome) {
        match &outcome.result {
            Ok(()) => self.health.report_success(&decision.provider_id),
            Err(message) => self.health.report_failure(&decision.provider_id, message),
        }
    }

    /// Provider health tracker
    pub const fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Load balancer counters
    pub const fn balancer(&self) -> &LoadBalancer {
        &self.balancer
    }

    /// Credential vault, if BYOK is configured
    pub const fn vault(&self) -> Option<&CredentialVault> {
        self.vault.as_ref()
    }
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("health", &self.health)
            .field("balancer", &self.balancer)
            .field("byok", &self.vault.is_some())
            .field("background_usage", &self.background.is_some())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

/// First ranked candidate whose provider the user holds a key for
async fn first_with_credential<'a>(
    vault: &CredentialVault,
    user_id: &str,
    candidates: &[Candidate<'a>],
) -> Option<Candidate<'a>> {
    let mut asked = HashSet::new();

    for candidate in candidates {
        let provider_id = candidate.provider.provider_id.as_str();
        if !asked.insert(provider_id) {
            continue;
        }

        if vault.has_credential(user_id, provider_id).await {
            return Some(*candidate);
        }
    }

    None
}
