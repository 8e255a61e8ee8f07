//! Logging initialization.
//!
//! The library only emits `tracing` events; the binary installs the
//! subscriber. Output goes to stderr so stdout stays free for the run report.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides `level` when set. Calling this twice is a no-op.
pub fn init(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Already initialized (e.g. by a test harness); keep the existing one.
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .ok(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok(),
    };
}

/// Initialize from config, with CLI flags taking precedence.
pub fn init_from_config(config: &LoggingConfig, verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let format = if json { LogFormat::Json } else { config.format };
    init(level, format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_keeps_first_subscriber() {
        init("debug", LogFormat::Pretty);
        init("info", LogFormat::Json);
        init_from_config(&LoggingConfig::default(), true, false);
        tracing::info!("still logging");
    }
}
