//! Telemetry for Conduit
//!
//! Installs a `tracing-subscriber` registry with an env filter and
//! either human-readable or JSON output.

use conduit_config::TelemetryConfig;
use tracing_subscriber::EnvFilter;

/// Initialize logging from configuration
///
/// `RUST_LOG`, when set, overrides the configured filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        registry.with(fmt_layer).try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(filter = %filter_directive(config), json = config.json, "logging initialized");
    Ok(())
}

/// The filter directive in effect: `RUST_LOG` if set, else the config
fn filter_directive(config: &TelemetryConfig) -> String {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.log_filter.clone())
}

fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    let directive = filter_directive(config);
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}', falling back to info: {e}");
        EnvFilter::new("info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_filter: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_filter: log_filter.to_owned(),
            json: false,
        }
    }

    #[test]
    fn config_filter_applies_without_rust_log() {
        temp_env::with_var_unset("RUST_LOG", || {
            assert_eq!(filter_directive(&config("conduit=debug")), "conduit=debug");
        });
    }

    #[test]
    fn rust_log_overrides_config() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            assert_eq!(filter_directive(&config("conduit=debug")), "warn");
        });
    }

    #[test]
    fn blank_rust_log_is_ignored() {
        temp_env::with_var("RUST_LOG", Some("  "), || {
            assert_eq!(filter_directive(&config("info")), "info");
        });
    }

    #[test]
    fn invalid_filter_falls_back() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = build_filter(&config("conduit=notalevel"));
            assert_eq!(filter.to_string(), "info");
        });
    }
}
