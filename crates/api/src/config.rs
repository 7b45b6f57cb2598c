//! API Configuration

use crate::rate_limit::RateLimitConfig;
use config::{Config, Environment};
use event_stream::StreamConfig;
use serde::Deserialize;
use state_store::DEFAULT_MAX_USERS;
use std::net::SocketAddr;
use thiserror::Error;

/// Fatal configuration problems. The process must not begin serving with
/// one of these outstanding.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),

    #[error("Invalid listen address: {0}")]
    Addr(String),
}

/// Ingestion service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// HTTP listen address
    pub listen_addr: String,
    /// Prometheus exporter listen address
    pub metrics_addr: String,
    /// Broker and topic settings
    pub stream: StreamConfig,
    /// Bound on each user's recent-transactions audit list
    pub audit_capacity: usize,
    /// Bound on distinct users tracked for auditing
    pub max_tracked_users: usize,
    /// Rate limiting for the transaction routes
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            metrics_addr: "0.0.0.0:9100".to_string(),
            stream: StreamConfig {
                client_id: "transaction-service".to_string(),
                ..StreamConfig::default()
            },
            audit_capacity: 10,
            max_tracked_users: DEFAULT_MAX_USERS,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load from the environment (`FRAUD__` prefix, `__` separator),
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let source = Config::builder()
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()?;

        let config: ApiConfig = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigurationError::Addr(self.listen_addr.clone()))?;
        self.metrics_socket_addr()?;
        Ok(())
    }

    /// Parsed metrics listen address
    pub fn metrics_socket_addr(&self) -> Result<SocketAddr, ConfigurationError> {
        self.metrics_addr
            .parse()
            .map_err(|_| ConfigurationError::Addr(self.metrics_addr.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.audit_capacity, 10);
        assert_eq!(config.stream.client_id, "transaction-service");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let config = ApiConfig {
            listen_addr: "nowhere".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigurationError::Addr(_))));
    }
}
