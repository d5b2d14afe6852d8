use std::io::Read as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use conduit_config::Config;
use conduit_core::{Catalog, RoutingDecision};
use conduit_routing::{EngineSettings, RoutingEngine, SelectOptions};
use conduit_usage::{JsonlUsageStore, MemoryUsageStore, Outcome, UsageRecorder, UsageStore};
use conduit_vault::{CredentialCipher, CredentialVault, MemoryCredentialStore};
use secrecy::SecretString;

use crate::args::{CostArgs, EncryptKeyArgs, RecordArgs, RouteArgs};

pub async fn route(config: &Config, args: &RouteArgs) -> anyhow::Result<()> {
    let (engine, catalog) = build(config, args)?;
    let decision = select(&engine, &catalog, config, args).await?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

pub async fn record(config: &Config, args: &RecordArgs) -> anyhow::Result<()> {
    let (engine, catalog) = build(config, &args.route)?;
    let decision = select(&engine, &catalog, config, &args.route).await?;

    let latency = Duration::from_millis(args.latency_ms);
    let outcome = match &args.error {
        Some(message) => Outcome::failure(args.prompt_tokens, args.completion_tokens, latency, message.clone()),
        None => Outcome::success(args.prompt_tokens, args.completion_tokens, latency),
    };

    let record = engine
        .report_outcome(&args.route.user, &decision, &outcome)
        .await
        .context("failed to record usage")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn cost(args: &CostArgs) {
    let total = conduit_usage::cost(args.prompt_tokens, args.completion_tokens, args.cost_in, args.cost_out);
    println!("{total}");
}

pub fn encrypt_key(config: &Config, args: EncryptKeyArgs) -> anyhow::Result<()> {
    let cipher = cipher(config)?.context("vault.encryption_key must be set to encrypt keys")?;

    let plaintext = match args.key {
        Some(key) => key,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read key from stdin")?;
            buf
        }
    };

    let plaintext = plaintext.trim();
    if plaintext.is_empty() {
        anyhow::bail!("provider key must not be empty");
    }

    let sealed = cipher.encrypt(&SecretString::from(plaintext.to_owned()))?;
    println!("{sealed}");
    Ok(())
}

async fn select(
    engine: &RoutingEngine,
    catalog: &Catalog,
    config: &Config,
    args: &RouteArgs,
) -> anyhow::Result<RoutingDecision> {
    let mut options = SelectOptions::from_config(&config.routing);
    if let Some(prefer_byok) = args.prefer_byok {
        options.prefer_byok = prefer_byok;
    }
    options.min_context_window = args.min_context_window;
    options.enable_load_balancing |= args.load_balance;

    engine
        .select_model(&args.power_level, &args.user, catalog, &options)
        .await
        .with_context(|| format!("no route for power level '{}'", args.power_level))
}

fn build(config: &Config, args: &RouteArgs) -> anyhow::Result<(RoutingEngine, Catalog)> {
    let raw = std::fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog {}", args.catalog.display()))?;
    let catalog = Catalog::from_toml_str(&raw).context("invalid catalog")?;

    let vault = match cipher(config)? {
        Some(cipher) => Some(vault(config, args, cipher)?),
        None if args.credentials.is_some() => {
            anyhow::bail!("vault.encryption_key must be set to use --credentials")
        }
        None => None,
    };

    let usage: Arc<dyn UsageStore> = match &config.usage.path {
        Some(path) => Arc::new(JsonlUsageStore::new(path)),
        None => Arc::new(MemoryUsageStore::new()),
    };

    let engine = RoutingEngine::new(
        &config.health,
        EngineSettings::from_config(config)?,
        vault,
        UsageRecorder::new(usage),
    );

    tracing::debug!(providers = catalog.len(), "catalog loaded");
    Ok((engine, catalog))
}

fn vault(config: &Config, args: &RouteArgs, cipher: CredentialCipher) -> anyhow::Result<CredentialVault> {
    let store = match &args.credentials {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read credentials {}", path.display()))?;
            MemoryCredentialStore::from_toml_str(&raw, &cipher).context("invalid credentials file")?
        }
        None => MemoryCredentialStore::new(),
    };

    tracing::debug!(credentials = store.len(), "credential store seeded");

    Ok(CredentialVault::new(
        Arc::new(store),
        cipher,
        config.vault.cache_ttl()?,
        config.vault.cache_capacity,
    ))
}

fn cipher(config: &Config) -> anyhow::Result<Option<CredentialCipher>> {
    config
        .vault
        .encryption_key
        .as_ref()
        .map(CredentialCipher::new)
        .transpose()
        .context("invalid vault.encryption_key")
}
