//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global `tracing` subscriber. Returns false when one is
/// already installed (tests, embedding hosts), which is not an error.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(level = %config.level, "logging initialized");
            true
        }
        Err(_) => false,
    }
}
