use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime settings for a [`crate::Monitor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Fixed delay between the end of one cycle's report and the next cycle (default: 15s).
    pub interval: Duration,
    /// Total transport budget for one probe, connect through body (default: 1000ms).
    pub request_timeout: Duration,
    /// A success response is UP only if it arrived strictly faster than this (default: 500ms).
    pub latency_threshold: Duration,
    /// Stop after this many completed cycles; `Some(0)` runs none. `None` runs until cancelled.
    pub max_cycles: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            request_timeout: Duration::from_millis(1000),
            latency_threshold: Duration::from_millis(500),
            max_cycles: None,
        }
    }
}

impl MonitorConfig {
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval = Duration::from_secs(secs);
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_latency_threshold_ms(mut self, ms: u64) -> Self {
        self.latency_threshold = Duration::from_millis(ms);
        self
    }

    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }
}
