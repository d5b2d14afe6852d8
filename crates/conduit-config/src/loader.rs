use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion fails,
    /// TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold, duration or key is unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_health()?;
        self.validate_vault()?;
        self.validate_routing()?;
        Ok(())
    }

    fn validate_routing(&self) -> anyhow::Result<()> {
        if self.routing.load_balancing_window()?.is_zero() {
            anyhow::bail!("routing.load_balancing_window must be greater than 0");
        }

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        if self.health.failure_threshold == 0 {
            anyhow::bail!("health.failure_threshold must be greater than 0");
        }

        Ok(())
    }

    fn validate_vault(&self) -> anyhow::Result<()> {
        if self.vault.cache_ttl()?.is_zero() {
            anyhow::bail!("vault.cache_ttl must be greater than 0");
        }

        self.vault.lookup_timeout()?;

        if self.vault.cache_capacity == 0 {
            anyhow::bail!("vault.cache_capacity must be greater than 0");
        }

        if self.vault.cache_capacity > 1_000_000 {
            anyhow::bail!("vault.cache_capacity exceeds maximum of 1,000,000");
        }

        if let Some(ref key) = self.vault.encryption_key
            && key.expose_secret().trim().is_empty()
        {
            anyhow::bail!("vault.encryption_key must not be empty when set");
        }

        Ok(())
    }
}
