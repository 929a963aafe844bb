//! System configuration and per-task interval resolution.
//!
//! The interval pair is assembled once at execution time from system config
//! plus task-level overrides; nothing reads ambient global state afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;

/// System-wide dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Seconds between polls while the remote job is running.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait before retrying after a transient remote error.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_retry_interval_secs() -> u64 {
    DEFAULT_RETRY_INTERVAL_SECS
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

/// The resolved poll/retry interval pair, immutable per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub poll: Duration,
    pub retry: Duration,
}

impl Intervals {
    /// Resolve intervals for one task: system defaults, overridden by the
    /// task config keys `poll_interval` / `retry_interval` (seconds).
    /// A key that is present but not a non-negative integer is a config
    /// error, not a silent fallback.
    pub fn resolve(system: &SystemConfig, task_config: &serde_json::Value) -> Result<Self, ConfigError> {
        let poll = override_secs(task_config, "poll_interval")?
            .unwrap_or(system.poll_interval_secs);
        let retry = override_secs(task_config, "retry_interval")?
            .unwrap_or(system.retry_interval_secs);
        Ok(Self {
            poll: Duration::from_secs(poll),
            retry: Duration::from_secs(retry),
        })
    }
}

fn override_secs(config: &serde_json::Value, key: &str) -> Result<Option<u64>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                detail: format!("expected non-negative integer seconds, got {value}"),
            }),
    }
}
