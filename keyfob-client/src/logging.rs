//! Tracing subscriber bootstrap.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use keyfob_core::config::GeneralConfig;

/// Install the global subscriber. `RUST_LOG` wins over `log_level`; an
/// unparsable level falls back to `info`.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &GeneralConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .finish()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .finish()
            .try_init()
    }
}
