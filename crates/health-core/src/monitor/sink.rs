//! Destinations for per-cycle availability reports.
//!
//! The monitor hands every finished cycle's [`AvailabilityReport`] to a
//! [`ReportSink`]. Sinks never fail the loop: write errors are logged and the
//! next cycle proceeds.

use std::io::Write;

use tokio::sync::mpsc;
use tracing::warn;

use crate::stats::AvailabilityReport;

pub trait ReportSink: Send {
    fn emit(&mut self, report: &AvailabilityReport);
}

/// Writes `<domain> has <percent>% availability percentage`, one line per domain.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl LineSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ReportSink for LineSink<W> {
    fn emit(&mut self, report: &AvailabilityReport) {
        let result = write!(self.writer, "{report}").and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!(cycle = report.cycle, error = %e, "Failed to write availability report");
        }
    }
}

/// Writes each report as one JSON object per line.
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ReportSink for JsonSink<W> {
    fn emit(&mut self, report: &AvailabilityReport) {
        let result = serde_json::to_writer(&mut self.writer, report)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.writer))
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!(cycle = report.cycle, error = %e, "Failed to write availability report");
        }
    }
}

pub fn report_channel() -> (
    mpsc::UnboundedSender<AvailabilityReport>,
    mpsc::UnboundedReceiver<AvailabilityReport>,
) {
    mpsc::unbounded_channel()
}

impl ReportSink for mpsc::UnboundedSender<AvailabilityReport> {
    fn emit(&mut self, report: &AvailabilityReport) {
        if self.send(report.clone()).is_err() {
            warn!(cycle = report.cycle, "Report receiver dropped");
        }
    }
}

impl ReportSink for Vec<AvailabilityReport> {
    fn emit(&mut self, report: &AvailabilityReport) {
        self.push(report.clone());
    }
}
