//! Configuration for the shipping adapter

use crate::retry::{Backoff, RetryPolicy};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for `max_retries`
pub const MAX_CONFIGURABLE_RETRIES: u32 = 10;

/// Backoff schedule kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Retry `n` waits `n * backoff_step_ms`
    Linear,
    /// Every retry waits `backoff_step_ms`
    Constant,
}

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Shipping service address (`host:port` or `http://host:port`)
    pub shipping_service_url: String,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff increment (milliseconds)
    pub backoff_step_ms: u64,

    /// Backoff schedule
    pub backoff: BackoffKind,

    /// Dial timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Dial at construction instead of on first call
    pub connect_eagerly: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            shipping_service_url: "http://localhost:8082".to_string(),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            backoff_step_ms: crate::DEFAULT_BACKOFF_STEP_SECONDS * 1000,
            backoff: BackoffKind::Linear,
            connect_timeout_ms: 5000,
            connect_eagerly: false,
        }
    }
}

impl AdapterConfig {
    /// Config for `url` with every other field defaulted
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            shipping_service_url: url.into(),
            ..Self::default()
        }
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: AdapterConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = AdapterConfig::default();

        if let Ok(url) = std::env::var("SHIPPING_SERVICE_URL") {
            config.shipping_service_url = url;
        }

        if let Ok(value) = std::env::var("SHIPPING_MAX_RETRIES") {
            config.max_retries = value.parse().map_err(|e| {
                Error::Config(format!("SHIPPING_MAX_RETRIES={}: {}", value, e))
            })?;
        }

        if let Ok(value) = std::env::var("SHIPPING_BACKOFF_STEP_MS") {
            config.backoff_step_ms = value.parse().map_err(|e| {
                Error::Config(format!("SHIPPING_BACKOFF_STEP_MS={}: {}", value, e))
            })?;
        }

        if let Ok(value) = std::env::var("SHIPPING_CONNECT_EAGERLY") {
            config.connect_eagerly = value.parse().map_err(|e| {
                Error::Config(format!("SHIPPING_CONNECT_EAGERLY={}: {}", value, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configs the adapter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.shipping_service_url.trim().is_empty() {
            return Err(Error::Config(
                "shipping_service_url must not be empty".to_string(),
            ));
        }
        if self.max_retries > MAX_CONFIGURABLE_RETRIES {
            return Err(Error::Config(format!(
                "max_retries {} exceeds {}",
                self.max_retries, MAX_CONFIGURABLE_RETRIES
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.backoff_step_ms == 0 && self.max_retries > 0 {
            return Err(Error::Config(
                "backoff_step_ms must be greater than 0 when retries are enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Dial timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Retry policy described by this config
    pub fn retry_policy(&self) -> RetryPolicy {
        let step = Duration::from_millis(self.backoff_step_ms);
        let backoff = match self.backoff {
            BackoffKind::Linear => Backoff::Linear { step },
            BackoffKind::Constant => Backoff::Constant { delay: step },
        };
        RetryPolicy::new(self.max_retries, backoff)
    }
}
