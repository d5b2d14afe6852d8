use std::sync::Arc;
use std::time::Duration;

use conduit_config::Config;
use conduit_core::Catalog;
use conduit_routing::{EngineSettings, RoutingEngine, SelectOptions};
use conduit_usage::{MemoryUsageStore, UsageRecorder};
use conduit_vault::{CredentialCipher, CredentialVault, MemoryCredentialStore};

const CONFIG: &str = r#"
[routing]
load_balancing = false
prefer_byok = true

[health]
failure_threshold = 2

[vault]
encryption_key = '{{ env.CONDUIT_IT_VAULT_KEY | default("fallback passphrase") }}'
cache_ttl = "1m"
lookup_timeout = "100ms"
"#;

const CATALOG: &str = r#"
[[providers]]
provider_id = "openai"
provider_name = "OpenAI"
provider_type = "openai"
priority = 1

[[providers.models]]
model_id = "gpt-4o-mini"
power_level = "eco"
cost_per_k_tokens_in = 0.00015
cost_per_k_tokens_out = 0.0006
context_window = 128000

[[providers]]
provider_id = "anthropic"
provider_name = "Anthropic"
provider_type = "anthropic"
priority = 2

[[providers.models]]
model_id = "claude-haiku"
power_level = "eco"
cost_per_k_tokens_in = 0.0008
cost_per_k_tokens_out = 0.004
context_window = 200000
"#;

const CREDENTIALS: &str = r#"
[[credentials]]
user_id = "u1"
provider_id = "anthropic"
key_name = "personal"
key = "sk-ant-user"
"#;

#[tokio::test]
async fn configured_engine_routes_end_to_end() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();

    let key = config.vault.encryption_key.as_ref().unwrap();
    let cipher = CredentialCipher::new(key).unwrap();
    let store = MemoryCredentialStore::from_toml_str(CREDENTIALS, &cipher).unwrap();
    let vault = CredentialVault::new(
        Arc::new(store),
        cipher,
        config.vault.cache_ttl().unwrap(),
        config.vault.cache_capacity,
    );

    let settings = EngineSettings::from_config(&config).unwrap();
    assert_eq!(settings.lookup_timeout, Duration::from_millis(100));

    let engine = RoutingEngine::new(
        &config.health,
        settings,
        Some(vault),
        UsageRecorder::new(Arc::new(MemoryUsageStore::new())),
    );
    let options = SelectOptions::from_config(&config.routing);

    let byok = engine.select_model("eco", "u1", &catalog, &options).await.unwrap();
    assert_eq!(byok.provider_id, "anthropic");
    assert!(byok.used_byok);

    let platform = engine.select_model("eco", "u2", &catalog, &options).await.unwrap();
    assert_eq!(platform.provider_id, "openai");
    assert!(!platform.used_byok);

    // Threshold of 2 from config
    engine.health().report_failure("openai", "x");
    engine.health().report_failure("openai", "x");
    let fallback = engine.select_model("eco", "u2", &catalog, &options).await.unwrap();
    assert_eq!(fallback.provider_id, "anthropic");
}

#[test]
fn invalid_catalog_is_rejected() {
    let duplicate = r#"
        [[providers]]
        provider_id = "openai"

        [[providers]]
        provider_id = "openai"
    "#;
    assert!(Catalog::from_toml_str(duplicate).is_err());
}
