//! Load balancing across equally preferred providers
//!
//! Every routed request bumps a per-provider counter that resets once
//! its window elapses. [`LoadBalancer::order`] turns those counters
//! into a weighted random permutation, so busy providers still receive
//! traffic but less of it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng as _;

/// Maps a provider's recent request count to a selection weight
pub trait Weighting: Send + Sync {
    /// Relative weight; must be finite and positive
    fn weight(&self, recent_requests: u64) -> f64;
}

/// `1 / (1 + recent)`: an idle provider weighs 1, weight halves at one
/// recent request, and so on
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseLoad;

impl Weighting for InverseLoad {
    #[allow(clippy::cast_precision_loss)]
    fn weight(&self, recent_requests: u64) -> f64 {
        1.0 / (1.0 + recent_requests as f64)
    }
}

/// Request counter for one provider's current window
struct Window {
    /// Milliseconds since the balancer's origin
    started_ms: AtomicU64,
    count: AtomicU64,
}

/// Tracks recent traffic per provider and orders priority bands by it
pub struct LoadBalancer {
    windows: DashMap<String, Window>,
    window: Duration,
    origin: Instant,
    weighting: Box<dyn Weighting>,
}

impl LoadBalancer {
    /// Balancer with the default [`InverseLoad`] weighting
    pub fn new(window: Duration) -> Self {
        Self::with_weighting(window, InverseLoad)
    }

    /// Balancer with a custom weighting policy
    pub fn with_weighting(window: Duration, weighting: impl Weighting + 'static) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            origin: Instant::now(),
            weighting: Box::new(weighting),
        }
    }

    /// Requests routed to the provider in the current window
    pub fn recent_requests(&self, provider_id: &str) -> u64 {
        let now = self.now_ms();
        self.windows.get(provider_id).map_or(0, |window| {
            if self.expired(&window, now) {
                0
            } else {
                window.count.load(Ordering::Acquire)
            }
        })
    }

    /// Count one routed request
    pub fn record(&self, provider_id: &str) {
        let now = self.now_ms();

        // Fast path avoids the shard write lock on hot providers
        if let Some(window) = self.windows.get(provider_id)
            && !self.expired(&window, now)
        {
            window.count.fetch_add(1, Ordering::AcqRel);
            return;
        }

        let window = self.windows.entry(provider_id.to_owned()).or_insert_with(|| Window {
            started_ms: AtomicU64::new(now),
            count: AtomicU64::new(0),
        });

        if self.expired(&window, now) {
            window.started_ms.store(now, Ordering::Release);
            window.count.store(1, Ordering::Release);
        } else {
            window.count.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Weighted random permutation of `provider_ids`
    ///
    /// Each provider draws `u^(1/w)` with `u` uniform in (0, 1] and `w`
    /// its weight; sorting by the draw descending yields a permutation
    /// in which lighter-loaded providers tend to come first.
    pub fn order<'a>(&self, provider_ids: &[&'a str]) -> Vec<&'a str> {
        if provider_ids.len() < 2 {
            return provider_ids.to_vec();
        }

        let mut rng = rand::rng();
        let mut keyed: Vec<(f64, &'a str)> = provider_ids
            .iter()
            .map(|&id| {
                let weight = self.weighting.weight(self.recent_requests(id));
                let weight = if weight.is_finite() && weight > 0.0 {
                    weight
                } else {
                    f64::MIN_POSITIVE
                };
                let u = 1.0 - rng.random::<f64>();
                (u.powf(1.0 / weight), id)
            })
            .collect();

        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn expired(&self, window: &Window, now_ms: u64) -> bool {
        let started = window.started_ms.load(Ordering::Acquire);
        u128::from(now_ms.saturating_sub(started)) >= self.window.as_millis()
    }
}

impl std::fmt::Debug for LoadBalancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancer")
            .field("providers", &self.windows.len())
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
