//! Notifier Configuration

use config::{Config, Environment};
use event_stream::StreamConfig;
use serde::Deserialize;
use state_store::DEFAULT_MAX_USERS;
use thiserror::Error;

/// Fatal configuration problems
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// Notifier service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Broker and topic settings
    pub stream: StreamConfig,
    /// Bound on each user's recent-alerts list
    pub recent_capacity: usize,
    /// Bound on distinct users tracked
    pub max_tracked_users: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig {
                client_id: "alert-notifier".to_string(),
                ..StreamConfig::default()
            },
            recent_capacity: 10,
            max_tracked_users: DEFAULT_MAX_USERS,
        }
    }
}

impl NotifierConfig {
    /// Load from the environment (`FRAUD__` prefix, `__` separator),
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let source = Config::builder()
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()?;

        Ok(source.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotifierConfig::default();
        assert_eq!(config.recent_capacity, 10);
        assert_eq!(config.stream.client_id, "alert-notifier");
    }
}
