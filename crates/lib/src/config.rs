//! Runtime configuration for managed objects and collections.
//!
//! Configuration is plain serde data so hosts can load it from JSON alongside
//! the rest of their settings.
//!
//! ```
//! use mapsync::SyncConfig;
//!
//! let config = SyncConfig::from_json(r#"{ "init_timeout_ms": 500 }"#).unwrap();
//! assert_eq!(config.init_timeout().unwrap().as_millis(), 500);
//! assert_eq!(config.event_capacity, 256);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_THROTTLE_INTERVAL_MS},
};

/// Tuning knobs shared through a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval over which native property changes are coalesced.
    pub throttle_interval_ms: f64,
    /// Upper bound on how long `init` waits for the ancestor map context.
    ///
    /// `None` waits indefinitely.
    pub init_timeout_ms: Option<u64>,
    /// Buffer size of outward notification channels.
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL_MS,
            init_timeout_ms: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Parse a configuration from JSON, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Coalescing interval as a [`Duration`].
    ///
    /// Negative or NaN values mean no coalescing; values too large for a
    /// `Duration` saturate.
    pub fn throttle_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.throttle_interval_ms.max(0.0) / 1000.0)
            .unwrap_or(Duration::MAX)
    }

    /// The `init` wait bound, if one is configured.
    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// Set the `init` wait bound.
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the coalescing interval.
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval_ms = interval.as_secs_f64() * 1000.0;
        self
    }
}
