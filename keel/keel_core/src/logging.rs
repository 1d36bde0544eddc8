//! Logging setup.
//!
//! Installs a `tracing` subscriber writing to stderr. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, which is not
/// treated as an error so tests and embedders can call this repeatedly.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| {
            ConfigError::Invalid(format!("Invalid log level {:?}: {}", config.level, err))
        })?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    Ok(installed)
}
