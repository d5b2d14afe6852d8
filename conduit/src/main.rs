#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use std::path::{Path, PathBuf};

use args::{Args, Command};
use clap::Parser;
use conduit_config::Config;

/// Config file picked up from the working directory when none is given
const DEFAULT_CONFIG: &str = "conduit.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (config, config_path) = load_config(args.config.as_deref())?;

    conduit_telemetry::init(&config.telemetry)?;

    match &config_path {
        Some(path) => tracing::debug!(config_path = %path.display(), "configuration loaded"),
        None => tracing::debug!("no configuration file, using defaults"),
    }

    match args.command {
        Command::Route(route) => commands::route(&config, &route).await,
        Command::Record(record) => commands::record(&config, &record).await,
        Command::Cost(cost) => {
            commands::cost(&cost);
            Ok(())
        }
        Command::EncryptKey(encrypt) => commands::encrypt_key(&config, encrypt),
    }
}

/// Load the explicit config, or `conduit.toml` if present, or defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((Config::load(path)?, Some(path.to_path_buf())));
    }

    let fallback = PathBuf::from(DEFAULT_CONFIG);
    if fallback.is_file() {
        return Ok((Config::load(&fallback)?, Some(fallback)));
    }

    Ok((Config::default(), None))
}
