use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::endpoint::{DomainKey, EndpointDescriptor, EndpointError};
use crate::monitor::sink::ReportSink;
use crate::monitor::state::{MonitorPhase, RunSummary};
use crate::prober::{ProbeOutcome, Prober};
use crate::stats::{AvailabilityReport, DomainAggregator};

#[derive(Debug, Clone)]
struct MonitoredEndpoint {
    descriptor: EndpointDescriptor,
    domain: DomainKey,
}

/// Probes every endpoint in declaration order, once per cycle, and owns the
/// cumulative per-domain counters for the whole run.
pub struct Monitor {
    endpoints: Vec<MonitoredEndpoint>,
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    aggregator: DomainAggregator,
    phase: MonitorPhase,
    cycles_completed: u64,
}

impl Monitor {
    /// Callers must not pass an empty endpoint list; there would be nothing to report.
    pub fn new(
        endpoints: Vec<EndpointDescriptor>,
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
    ) -> Result<Self, EndpointError> {
        let endpoints = endpoints
            .into_iter()
            .map(|descriptor| {
                let domain = descriptor.domain_key()?;
                Ok(MonitoredEndpoint { descriptor, domain })
            })
            .collect::<Result<Vec<_>, EndpointError>>()?;

        Ok(Self {
            endpoints,
            config,
            prober,
            aggregator: DomainAggregator::new(),
            phase: MonitorPhase::Idle,
            cycles_completed: 0,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn aggregator(&self) -> &DomainAggregator {
        &self.aggregator
    }

    /// Runs one full cycle without sleeping: probe every endpoint, then report.
    pub async fn run_cycle(&mut self, sink: &mut dyn ReportSink) -> AvailabilityReport {
        self.set_phase(MonitorPhase::Probing);
        for index in 0..self.endpoints.len() {
            let outcome = self.prober.probe(&self.endpoints[index].descriptor).await;
            self.record(index, outcome);
        }
        self.report(sink)
    }

    /// Cycles until `cancel` fires or `max_cycles` is reached.
    ///
    /// Cancellation is honoured mid-probe and mid-sleep. A probe interrupted by
    /// cancellation is dropped unrecorded, so counters only ever reflect
    /// completed probes.
    pub async fn run(&mut self, sink: &mut dyn ReportSink, cancel: CancellationToken) -> RunSummary {
        let cycles_before = self.cycles_completed;
        info!(
            endpoints = self.endpoints.len(),
            interval_secs = self.config.interval.as_secs(),
            "Starting monitor"
        );

        'cycles: loop {
            if cancel.is_cancelled() || self.limit_reached(cycles_before) {
                break;
            }

            self.set_phase(MonitorPhase::Probing);
            for index in 0..self.endpoints.len() {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'cycles,
                    outcome = self.prober.probe(&self.endpoints[index].descriptor) => outcome,
                };
                self.record(index, outcome);
            }
            self.report(sink);

            // No sleep after the final cycle.
            if self.limit_reached(cycles_before) || cancel.is_cancelled() {
                break;
            }

            self.set_phase(MonitorPhase::Sleeping);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        self.set_phase(MonitorPhase::Stopped);
        let summary = RunSummary {
            cycles: self.cycles_completed - cycles_before,
            cancelled: cancel.is_cancelled(),
        };
        info!(
            cycles = summary.cycles,
            cancelled = summary.cancelled,
            "Monitor stopped"
        );
        summary
    }

    fn limit_reached(&self, cycles_before: u64) -> bool {
        self.config
            .max_cycles
            .is_some_and(|max| self.cycles_completed - cycles_before >= max)
    }

    fn record(&self, index: usize, outcome: ProbeOutcome) {
        let endpoint = &self.endpoints[index];
        self.aggregator.record(&endpoint.domain, outcome);
        debug!(
            cycle = self.cycles_completed + 1,
            endpoint = endpoint.descriptor.label(),
            domain = %endpoint.domain,
            %outcome,
            "Recorded probe"
        );
    }

    fn report(&mut self, sink: &mut dyn ReportSink) -> AvailabilityReport {
        self.set_phase(MonitorPhase::Reporting);
        self.cycles_completed += 1;
        let report = self.aggregator.snapshot().with_cycle(self.cycles_completed);
        info!(
            cycle = report.cycle,
            domains = report.domains.len(),
            "Cycle complete"
        );
        sink.emit(&report);
        report
    }

    fn set_phase(&mut self, next: MonitorPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid monitor phase transition {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }
}
