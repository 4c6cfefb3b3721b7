// Poller configuration from environment variables

use anyhow::{bail, Context, Result};
use bugbash_core::DEFAULT_POLL_CURSOR_ID;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the poll scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Whether the embedding process should start the poller at all
    pub enabled: bool,
    /// Time between poll ticks
    pub interval: Duration,
    /// How long stop() waits for the worker task to finish
    pub stop_grace: Duration,
    /// Identity of the persisted cursor row
    pub cursor_id: String,
    /// Capacity of the failure channel handed to the supervisor
    pub error_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            stop_grace: Duration::from_millis(1000),
            cursor_id: DEFAULT_POLL_CURSOR_ID.to_string(),
            error_capacity: 64,
        }
    }
}

impl PollerConfig {
    /// Create configuration from environment variables
    ///
    /// - `POLLER_ENABLED` (default `true`)
    /// - `POLL_INTERVAL_SECS` (default `60`)
    /// - `POLL_STOP_GRACE_MS` (default `1000`)
    /// - `POLL_CURSOR_ID` (default `1`)
    /// - `POLL_ERROR_CAPACITY` (default `64`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Self {
            enabled: env_or("POLLER_ENABLED", defaults.enabled)?,
            interval: Duration::from_secs(env_or(
                "POLL_INTERVAL_SECS",
                defaults.interval.as_secs(),
            )?),
            stop_grace: Duration::from_millis(env_or(
                "POLL_STOP_GRACE_MS",
                defaults.stop_grace.as_millis() as u64,
            )?),
            cursor_id: std::env::var("POLL_CURSOR_ID").unwrap_or(defaults.cursor_id),
            error_capacity: env_or("POLL_ERROR_CAPACITY", defaults.error_capacity)?.max(1),
        }
        .validate()
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(self) -> Result<Self> {
        if self.interval.is_zero() {
            bail!("Poll interval must be greater than zero");
        }
        Ok(self)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_cursor_id(mut self, id: impl Into<String>) -> Self {
        self.cursor_id = id.into();
        self
    }

    pub fn with_error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity.max(1);
        self
    }
}

/// Parse an environment variable, falling back to `default` when unset
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
