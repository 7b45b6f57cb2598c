//! Detector Configuration

use crate::worker::RetryPolicy;
use config::{Config, Environment};
use event_stream::StreamConfig;
use rule_engine::RuleConfig;
use serde::Deserialize;
use state_store::DEFAULT_MAX_USERS;
use std::net::SocketAddr;
use thiserror::Error;

/// Fatal configuration problems. The process must not begin consuming
/// with one of these outstanding.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),

    #[error("Invalid metrics address: {0}")]
    MetricsAddr(String),

    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// Detection service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Broker and topic settings
    pub stream: StreamConfig,
    /// Rule thresholds
    pub rules: RuleConfig,
    /// Number of partitioned workers; all of a user's transactions land
    /// on the same worker
    pub workers: usize,
    /// Bound on distinct users tracked in the state store
    pub max_tracked_users: usize,
    /// Retry attempts for transient state-store failures
    pub max_retries: u32,
    /// Base retry backoff (milliseconds)
    pub retry_backoff_ms: u64,
    /// Prometheus exporter listen address
    pub metrics_addr: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig {
                client_id: "fraud-detector".to_string(),
                ..StreamConfig::default()
            },
            rules: RuleConfig::default(),
            workers: 4,
            max_tracked_users: DEFAULT_MAX_USERS,
            max_retries: 3,
            retry_backoff_ms: 100,
            metrics_addr: "0.0.0.0:9101".to_string(),
        }
    }
}

impl DetectorConfig {
    /// Load from the environment (`FRAUD__` prefix, `__` separator),
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let source = Config::builder()
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()?;

        let config: DetectorConfig = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.workers == 0 {
            return Err(ConfigurationError::NoWorkers);
        }
        self.metrics_socket_addr()?;
        Ok(())
    }

    /// Parsed metrics listen address
    pub fn metrics_socket_addr(&self) -> Result<SocketAddr, ConfigurationError> {
        self.metrics_addr
            .parse()
            .map_err(|_| ConfigurationError::MetricsAddr(self.metrics_addr.clone()))
    }

    /// Retry policy for the worker pool
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_ms: self.retry_backoff_ms,
        }
    }
}
