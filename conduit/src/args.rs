use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Conduit model router
#[derive(Debug, Parser)]
#[command(name = "conduit", about = "Power-level model routing with BYOK credentials")]
pub struct Args {
    /// Path to configuration file; `conduit.toml` is used if present
    #[arg(short, long, env = "CONDUIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select a provider and model and print the decision as JSON
    Route(RouteArgs),
    /// Select, then report an outcome and print the usage record
    Record(RecordArgs),
    /// Compute the cost of a request
    Cost(CostArgs),
    /// Encrypt a provider key with the configured vault key
    EncryptKey(EncryptKeyArgs),
}

/// Inputs shared by every command that routes
#[derive(Debug, ClapArgs)]
pub struct RouteArgs {
    /// Provider catalog TOML
    #[arg(long, env = "CONDUIT_CATALOG")]
    pub catalog: PathBuf,

    /// eco, balanced or precision
    #[arg(short, long, default_value = "balanced")]
    pub power_level: String,

    /// Caller identity for BYOK lookup and usage
    #[arg(short, long, default_value = "anonymous")]
    pub user: String,

    /// `[[credentials]]` TOML seeding the in-memory credential store
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Override `routing.prefer_byok`
    #[arg(long)]
    pub prefer_byok: Option<bool>,

    /// Require at least this many tokens of context
    #[arg(long)]
    pub min_context_window: Option<u32>,

    /// Force load balancing on regardless of `routing.load_balancing`
    #[arg(long)]
    pub load_balance: bool,
}

#[derive(Debug, ClapArgs)]
pub struct RecordArgs {
    #[command(flatten)]
    pub route: RouteArgs,

    #[arg(long, default_value_t = 0)]
    pub prompt_tokens: u64,

    #[arg(long, default_value_t = 0)]
    pub completion_tokens: u64,

    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Record a failed call with this message
    #[arg(long)]
    pub error: Option<String>,
}

#[derive(Debug, ClapArgs)]
pub struct CostArgs {
    #[arg(long)]
    pub prompt_tokens: u64,

    #[arg(long)]
    pub completion_tokens: u64,

    /// Price per 1000 prompt tokens
    #[arg(long)]
    pub cost_in: f64,

    /// Price per 1000 completion tokens
    #[arg(long)]
    pub cost_out: f64,
}

#[derive(Debug, ClapArgs)]
pub struct EncryptKeyArgs {
    /// Plaintext provider key; read from stdin when omitted
    #[arg(long, env = "CONDUIT_PROVIDER_KEY", hide_env_values = true)]
    pub key: Option<String>,
}
