//! Fraud-Detection Rule Engine
//!
//! Consumes one transaction at a time, updates per-user state through the
//! injected store, and applies three independent rules:
//! - large transaction (fixed amount threshold)
//! - high frequency (velocity window over recent timestamps)
//! - unusual location change (against the last-known baseline)
//!
//! Evaluation is per-user serialized by the caller; the engine itself is
//! stateless between invocations.

mod alert;
mod config;
mod engine;
mod error;

pub use alert::{Alert, AlertReason};
pub use config::RuleConfig;
pub use engine::FraudEngine;
pub use error::EngineError;
