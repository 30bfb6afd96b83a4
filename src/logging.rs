//! Logging setup

use rolling_logger::{init_logger, LogBuffer, LoggerError};

use crate::config::ClientConfig;

/// Install the global subscriber from the config's filter.
///
/// The returned buffer holds the most recent lines for a diagnostics view.
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init(config: &ClientConfig) -> Result<LogBuffer, LoggerError> {
    let buffer = init_logger(&config.log_filter, config.log_capacity)?;
    tracing::info!(api_url = %config.api_url, filter = %config.log_filter, "logging initialized");
    Ok(buffer)
}
