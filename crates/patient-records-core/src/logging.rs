//! Tracing setup.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns false if a subscriber
/// was already installed, which is harmless.
pub fn init(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
