use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// BYOK credential vault configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Process-wide symmetric key: base64 of 32 bytes, or a passphrase
    #[serde(default)]
    pub encryption_key: Option<SecretString>,
    /// How long decrypted credentials stay cached (e.g. "5m")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
    /// Maximum cached (user, provider) entries
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Budget for the BYOK lookup inside one routing call (e.g. "50ms")
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            cache_ttl: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            lookup_timeout: default_lookup_timeout(),
        }
    }
}

impl VaultConfig {
    /// Parsed cache TTL
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL is not a valid duration
    pub fn cache_ttl(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("vault.cache_ttl", &self.cache_ttl)
    }

    /// Parsed lookup timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid duration
    pub fn lookup_timeout(&self) -> anyhow::Result<Duration> {
        crate::parse_duration("vault.lookup_timeout", &self.lookup_timeout)
    }
}

fn default_cache_ttl() -> String {
    "5m".to_owned()
}

const fn default_cache_capacity() -> u64 {
    10_000
}

fn default_lookup_timeout() -> String {
    "50ms".to_owned()
}
