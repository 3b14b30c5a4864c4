//! Session watcher configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_AUTH_ERROR_DEBOUNCE, DEFAULT_EVENT_CAPACITY, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_POLL_INTERVAL,
};

/// Errors raised while loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid configuration for '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {source}")]
    Read {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("Failed to parse configuration: {source}")]
    Parse {
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// Timing and buffering knobs of the session watcher.
///
/// Durations are (de)serialized as milliseconds. Missing fields take the
/// defaults from [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval between liveness polls.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    /// Idle time after which a session is force-closed.
    #[serde(rename = "idle_timeout_ms", with = "millis")]
    pub idle_timeout: Duration,

    /// Delay before an auth error from the networking layer is broadcast.
    #[serde(rename = "auth_error_debounce_ms", with = "millis")]
    pub auth_error_debounce: Duration,

    /// Events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            auth_error_debounce: DEFAULT_AUTH_ERROR_DEBOUNCE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Loads and validates a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read { source })?;
        let config: Config =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values can drive the watcher.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "idle_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval > self.idle_timeout {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: format!(
                    "{}ms exceeds the idle timeout of {}ms",
                    self.poll_interval.as_millis(),
                    self.idle_timeout.as_millis()
                ),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
