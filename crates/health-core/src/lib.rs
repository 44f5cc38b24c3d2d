#![forbid(unsafe_code)]

pub mod config;
pub mod endpoint;
pub mod monitor;
pub mod prober;
pub mod stats;

pub use config::MonitorConfig;
pub use endpoint::{DomainKey, EndpointDescriptor, EndpointError, HttpMethod};
pub use monitor::{
    report_channel, JsonSink, LineSink, Monitor, MonitorPhase, ReportSink, RunSummary,
};
pub use prober::{classify, HttpProber, ProbeError, ProbeOutcome, ProbeSuccess, Prober};
pub use stats::{availability_percent, AvailabilityReport, DomainAggregator, DomainAvailability};
pub use tokio_util::sync::CancellationToken;
