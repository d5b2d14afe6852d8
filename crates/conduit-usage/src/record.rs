use std::time::Duration;

use conduit_core::{PowerLevel, RoutingDecision};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the routed request succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Success,
    Error,
}

/// What happened when the caller executed a routing decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Prompt tokens consumed
    pub prompt_tokens: u64,
    /// Completion tokens generated
    pub completion_tokens: u64,
    /// Wall time of the provider call
    pub latency: Duration,
    /// `Err` carries the provider's error message
    pub result: Result<(), String>,
}

impl Outcome {
    /// Successful call
    pub const fn success(prompt_tokens: u64, completion_tokens: u64, latency: Duration) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            latency,
            result: Ok(()),
        }
    }

    /// Failed call; token counts are whatever the provider reported
    pub fn failure(prompt_tokens: u64, completion_tokens: u64, latency: Duration, message: impl Into<String>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            latency,
            result: Err(message.into()),
        }
    }

    /// Status for the usage log
    pub const fn status(&self) -> UsageStatus {
        match self.result {
            Ok(()) => UsageStatus::Success,
            Err(_) => UsageStatus::Error,
        }
    }

    /// Error message, if the call failed
    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}

/// One append-only usage log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: String,
    pub provider_id: String,
    pub model_id: String,
    pub power_level: PowerLevel,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Computed from the decision's per-1000-token prices
    pub cost: f64,
    pub latency_ms: u64,
    pub status: UsageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub used_byok: bool,
    pub timestamp: Timestamp,
}

impl UsageRecord {
    /// Build the record for an executed decision, stamped now
    pub fn new(user_id: &str, decision: &RoutingDecision, outcome: &Outcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            provider_id: decision.provider_id.clone(),
            model_id: decision.model_id.clone(),
            power_level: decision.power_level,
            prompt_tokens: outcome.prompt_tokens,
            completion_tokens: outcome.completion_tokens,
            cost: decision.cost_for(outcome.prompt_tokens, outcome.completion_tokens),
            latency_ms: u64::try_from(outcome.latency.as_millis()).unwrap_or(u64::MAX),
            status: outcome.status(),
            error_message: outcome.error_message().map(ToOwned::to_owned),
            used_byok: decision.used_byok,
            timestamp: Timestamp::now(),
        }
    }
}
