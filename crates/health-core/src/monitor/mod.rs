pub mod engine;
pub mod sink;
pub mod state;

pub use engine::Monitor;
pub use sink::{report_channel, JsonSink, LineSink, ReportSink};
pub use state::{MonitorPhase, RunSummary};
