//! Client configuration.
//!
//! All values are caller-supplied; nothing is read from the environment. The struct
//! deserializes with serde, so it can be embedded in an application's own config file.
//!
//! ```rust
//! use apiguard::ClientConfig;
//!
//! let config: ClientConfig =
//!     serde_json::from_str(r#"{ "base_url": "https://api.example.test", "timeout_ms": 5000 }"#)
//!         .unwrap();
//! assert_eq!(config.max_attempts, 3);
//! config.validate().unwrap();
//! ```

use crate::backoff::DEFAULT_BASE_DELAY;
use crate::descriptor::parse_header;
use crate::retry::DEFAULT_MAX_ATTEMPTS;
use crate::timeout::DEFAULT_TIMEOUT;
use crate::{Backoff, RetryPolicy, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Invalid client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("invalid default header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative request URLs.
    pub base_url: Option<String>,
    /// Per-attempt deadline.
    pub timeout_ms: u64,
    /// Total attempts for retrying calls; `0` behaves like `1`.
    pub max_attempts: usize,
    /// Linear backoff base between attempts.
    pub base_delay_ms: u64,
    /// Headers sent with every request unless a request overrides them.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: millis(DEFAULT_TIMEOUT),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: millis(DEFAULT_BASE_DELAY),
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout_policy()?;
        for (name, value) in &self.default_headers {
            parse_header(name, value).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.message().to_string(),
            })?;
        }
        Ok(())
    }

    pub fn timeout_policy(&self) -> Result<TimeoutPolicy, ConfigError> {
        TimeoutPolicy::from_millis(self.timeout_ms).map_err(|_| ConfigError::ZeroTimeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .backoff(Backoff::linear(Duration::from_millis(self.base_delay_ms)))
            .build()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
