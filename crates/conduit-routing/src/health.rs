//! Provider health tracking
//!
//! Each provider moves healthy -> degraded on its first consecutive
//! failure and degraded -> unhealthy when the failure count reaches the
//! configured threshold. Any success returns it to healthy. There is no
//! timer-based recovery: an unhealthy provider stays out of rotation
//! until a success is reported for it.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU32, Ordering};

use conduit_config::HealthConfig;
use conduit_core::HealthStatus;
use dashmap::DashMap;
use jiff::Timestamp;

/// Point-in-time copy of a provider's health
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_transition_at: Option<Timestamp>,
}

/// Per-provider health state
struct ProviderHealth {
    status: AtomicU8,
    consecutive_failures: AtomicU32,
    /// Unix milliseconds of the last status change, 0 = never
    last_transition_ms: AtomicI64,
    last_error: Mutex<Option<String>>,
}

impl ProviderHealth {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(encode(HealthStatus::Healthy)),
            consecutive_failures: AtomicU32::new(0),
            last_transition_ms: AtomicI64::new(0),
            last_error: Mutex::new(None),
        }
    }

    fn status(&self) -> HealthStatus {
        decode(self.status.load(Ordering::Acquire))
    }

    /// Swap in a new status, stamping the transition time if it changed
    fn transition(&self, next: HealthStatus) -> HealthStatus {
        let previous = decode(self.status.swap(encode(next), Ordering::AcqRel));
        if previous != next {
            self.last_transition_ms
                .store(Timestamp::now().as_millisecond(), Ordering::Release);
        }
        previous
    }

    fn set_last_error(&self, error: &str) {
        let mut slot = self
            .last_error
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(error.to_owned());
    }

    fn snapshot(&self) -> HealthRecord {
        let last_error = self
            .last_error
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        let transition_ms = self.last_transition_ms.load(Ordering::Acquire);

        HealthRecord {
            status: self.status(),
            consecutive_failures: self.consecutive_failures.load(Ordering::Acquire),
            last_error,
            last_transition_at: (transition_ms != 0)
                .then(|| Timestamp::from_millisecond(transition_ms).ok())
                .flatten(),
        }
    }
}

/// Tracks provider health from reported call outcomes
///
/// Records are created on the first signal for a provider and never
/// removed. Reads never block writers for other providers.
pub struct HealthTracker {
    providers: DashMap<String, ProviderHealth>,
    failure_threshold: u32,
}

impl HealthTracker {
    /// Create a tracker with the configured failure threshold
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            providers: DashMap::new(),
            failure_threshold: config.failure_threshold.max(1),
        }
    }

    /// Record a failed call to a provider
    pub fn report_failure(&self, provider_id: &str, error: &str) {
        let health = self
            .providers
            .entry(provider_id.to_owned())
            .or_insert_with(ProviderHealth::new);

        let failures = health.consecutive_failures.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        let next = if failures >= self.failure_threshold {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        health.set_last_error(error);
        let previous = health.transition(next);
        drop(health);

        if previous == next {
            return;
        }

        if next == HealthStatus::Unhealthy {
            tracing::warn!(
                provider = provider_id,
                consecutive_failures = failures,
                error,
                "provider marked unhealthy"
            );
        } else {
            tracing::debug!(provider = provider_id, error, "provider degraded");
        }
    }

    /// Record a successful call to a provider
    pub fn report_success(&self, provider_id: &str) {
        let health = self
            .providers
            .entry(provider_id.to_owned())
            .or_insert_with(ProviderHealth::new);

        health.consecutive_failures.store(0, Ordering::Release);
        let previous = health.transition(HealthStatus::Healthy);
        drop(health);

        if previous != HealthStatus::Healthy {
            tracing::info!(provider = provider_id, from = ?previous, "provider recovered");
        }
    }

    /// Current status; providers never reported on are healthy
    pub fn status(&self, provider_id: &str) -> HealthStatus {
        self.providers
            .get(provider_id)
            .map_or(HealthStatus::Healthy, |health| health.status())
    }

    /// Whether the provider may receive traffic
    pub fn is_usable(&self, provider_id: &str) -> bool {
        self.is_usable_with_seed(provider_id, HealthStatus::Healthy)
    }

    /// Whether the provider may receive traffic, falling back to `seed`
    /// when the tracker has not seen the provider yet
    pub fn is_usable_with_seed(&self, provider_id: &str, seed: HealthStatus) -> bool {
        let status = self
            .providers
            .get(provider_id)
            .map_or(seed, |health| health.status());
        status != HealthStatus::Unhealthy
    }

    /// Snapshot of one provider, if it has been reported on
    pub fn record(&self, provider_id: &str) -> Option<HealthRecord> {
        self.providers.get(provider_id).map(|health| health.snapshot())
    }

    /// Snapshot of every tracked provider
    pub fn snapshot(&self) -> Vec<(String, HealthRecord)> {
        let mut records: Vec<_> = self
            .providers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }
}

impl std::fmt::Debug for HealthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthTracker")
            .field("providers", &self.providers.len())
            .field("failure_threshold", &self.failure_threshold)
            .finish()
    }
}

const fn encode(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Degraded => 1,
        HealthStatus::Unhealthy => 2,
    }
}

const fn decode(raw: u8) -> HealthStatus {
    match raw {
        0 => HealthStatus::Healthy,
        1 => HealthStatus::Degraded,
        _ => HealthStatus::Unhealthy,
    }
}
