//! Client Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_URL_VAR: &str = "KANBAN_API_URL";
const API_TOKEN_VAR: &str = "KANBAN_API_TOKEN";
const LOG_VAR: &str = "KANBAN_LOG";

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_log_capacity() -> usize {
    rolling_logger::DEFAULT_CAPACITY
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid api url '{0}': expected an http(s) url")]
    InvalidUrl(String),
}

/// Remote endpoint and logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Lines kept by the in-memory log buffer
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            log_filter: default_log_filter(),
            log_capacity: default_log_capacity(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = read(API_URL_VAR).ok_or(ConfigError::Missing(API_URL_VAR))?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(api_url));
        }

        let mut config = Self::new(api_url);
        config.token = read(API_TOKEN_VAR);
        if let Some(filter) = read(LOG_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }
}
