//! Subscriber setup for the `tracing` events the combinators emit.

use ligature_core::config::LOG_ENV;
use ligature_core::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize a simple stdout tracing subscriber for development
pub fn init_stdout_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info,ligature_runtime=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Install a global subscriber described by `config`.
///
/// Fails if the filter does not parse or a global subscriber is already
/// installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_new(&config.filter)?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    tracing::debug!(filter = %config.filter, format = ?config.format, "tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_reported() {
        let config = TelemetryConfig {
            filter: "ligature=loudest".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(init_tracing(&config).is_err());
    }
}
