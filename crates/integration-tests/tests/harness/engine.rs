//! Routing engine builder

use std::sync::Arc;
use std::time::Duration;

use conduit_config::HealthConfig;
use conduit_routing::{EngineSettings, RoutingEngine};
use conduit_usage::{MemoryUsageStore, UsageRecorder, UsageStore};
use conduit_vault::{CredentialCipher, CredentialStore, CredentialVault};
use secrecy::SecretString;

pub const VAULT_KEY: &str = "integration test vault key";

pub fn cipher() -> CredentialCipher {
    CredentialCipher::new(&SecretString::from(VAULT_KEY.to_owned())).expect("valid test key")
}

pub fn vault(store: Arc<dyn CredentialStore>) -> CredentialVault {
    CredentialVault::new(store, cipher(), Duration::from_secs(300), 1_000)
}

/// Builder for engines under test
pub struct EngineBuilder {
    failure_threshold: u32,
    settings: EngineSettings,
    vault: Option<CredentialVault>,
    usage: Arc<dyn UsageStore>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            settings: EngineSettings::default(),
            vault: None,
            usage: Arc::new(MemoryUsageStore::new()),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vault(mut self, vault: CredentialVault) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn usage(mut self, store: Arc<dyn UsageStore>) -> Self {
        self.usage = store;
        self
    }

    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.settings.lookup_timeout = timeout;
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn build(self) -> RoutingEngine {
        RoutingEngine::new(
            &HealthConfig {
                failure_threshold: self.failure_threshold,
            },
            self.settings,
            self.vault,
            UsageRecorder::new(self.usage),
        )
    }
}
