//! Polling policy for long-running operations
//!
//! Accepted create/update/delete requests are polled until they reach a
//! terminal state. The interval applies whenever the service does not send
//! a `Retry-After` header; the timeout bounds the whole poll loop.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ConfigError, Result};

/// Configuration for operation polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between status checks when the service gives no hint
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum seconds to wait for an operation to finish
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A zero interval would poll without pause when no `Retry-After` is sent
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_interval_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_request_timeout_secs() -> u64 {
    60
}
