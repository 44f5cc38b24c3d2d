mod http;

pub use http::HttpProber;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::EndpointDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeOutcome {
    Up,
    Down,
}

impl ProbeOutcome {
    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// A probe that met both halves of the UP contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSuccess {
    pub status: u16,
    pub latency: Duration,
}

/// Why a probe was classified DOWN. Transport failures carry no latency sample.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP status {status} from {url} after {}ms", .latency.as_millis())]
    Status {
        url: String,
        status: u16,
        latency: Duration,
    },
    #[error("Slow response from {url}: {}ms (limit {}ms)", .latency.as_millis(), .threshold.as_millis())]
    Slow {
        url: String,
        status: u16,
        latency: Duration,
        threshold: Duration,
    },
    #[error("Timeout probing {url}")]
    Timeout { url: String },
    #[error("Network error probing {url}: {reason}")]
    Network { url: String, reason: String },
}

impl ProbeError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Slow { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn latency(&self) -> Option<Duration> {
        match self {
            Self::Status { latency, .. } | Self::Slow { latency, .. } => Some(*latency),
            _ => None,
        }
    }
}

/// UP requires a 2xx status and a latency strictly under `threshold`.
pub fn classify(status: u16, latency: Duration, threshold: Duration) -> ProbeOutcome {
    if (200..300).contains(&status) && latency < threshold {
        ProbeOutcome::Up
    } else {
        ProbeOutcome::Down
    }
}

/// Issues exactly one request for an endpoint and classifies it.
///
/// Implementations absorb every failure into [`ProbeOutcome::Down`]; nothing
/// a probe does may abort the monitor loop.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome;
}
