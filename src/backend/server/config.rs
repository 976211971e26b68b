/**
 * Server Configuration
 *
 * This module loads the application configuration and installs logging.
 *
 * # Configuration Sources
 *
 * Configuration is read from an optional TOML file and overridden by
 * environment variables; see [`AppConfig::load`]. A `.env` file in the
 * working directory is read first so its values count as environment.
 */

use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::shared::{AppConfig, ConfigError};

/// Load configuration for a server process
///
/// # Arguments
///
/// * `path` - Explicit configuration file, or `None` for the default location
///
/// # Example
///
/// ```rust,no_run
/// use xfcollab::backend::server::config::load_config;
///
/// let config = load_config(None).expect("valid configuration");
/// println!("Using {}", config.database_url);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if dotenv::dotenv().is_ok() {
        tracing::debug!("[Server] Loaded .env file");
    }
    AppConfig::load(path)
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` has already been folded into `config.log_filter` by
/// [`AppConfig::load`]. Calling this twice is harmless; the second call
/// leaves the first subscriber in place.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|e| {
        eprintln!(
            "[STARTUP] Invalid log filter {:?} ({}), falling back to info",
            config.log_filter, e
        );
        EnvFilter::new("info")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
